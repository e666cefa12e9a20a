//! Text normalization shared by every matcher
//!
//! Reduces arbitrary text to lowercase ASCII letters, digits and single
//! spaces so that wake phrases, executable names and device names are all
//! compared on the same footing.

use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Normalize text for matching: strip accents, drop punctuation and symbols,
/// collapse whitespace and lowercase.
///
/// Never fails; empty input yields an empty string.
pub fn normalize(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }

    let filtered: String = text
        .nfd()
        .filter(|c| !is_combining_mark(*c))
        .filter(|c| c.is_ascii_alphanumeric() || c.is_whitespace())
        .collect();

    filtered
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_ascii_lowercase()
}
