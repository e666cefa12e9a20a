//! Fuzzy string similarity
//!
//! All ratios are built on the longest common subsequence of two strings:
//! `ratio = 2 * lcs / (len(a) + len(b))`. The wake threshold and the device
//! threshold are calibrated against this scale, so do not swap in an
//! edit-distance metric.
//!
//! Inputs are expected to be normalized (see [`crate::normalize`]).

use std::collections::BTreeSet;

/// Length of the longest common subsequence of two char slices
fn lcs_len(a: &[char], b: &[char]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];

    for ca in a {
        for (j, cb) in b.iter().enumerate() {
            curr[j + 1] = if ca == cb {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

fn chars_ratio(a: &[char], b: &[char]) -> f64 {
    let total = a.len() + b.len();
    if total == 0 {
        return 1.0;
    }
    2.0 * lcs_len(a, b) as f64 / total as f64
}

/// Character-sequence similarity in `[0, 1]`; two empty strings are identical
pub fn ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    chars_ratio(&a, &b)
}

/// Insertions + deletions needed to turn `a` into `b`
fn indel_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    a.len() + b.len() - 2 * lcs_len(&a, &b)
}

fn token_set(text: &str) -> BTreeSet<&str> {
    text.split_whitespace().collect()
}

/// Jaccard index of the word-token sets of two strings, in `[0, 1]`
pub fn token_overlap(a: &str, b: &str) -> f64 {
    let a = token_set(a);
    let b = token_set(b);
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    let shared = a.intersection(&b).count();
    let union = a.union(&b).count();
    shared as f64 / union as f64
}

fn join(tokens: &[&str]) -> String {
    tokens.join(" ")
}

fn norm_sim(dist: usize, lensum: usize) -> f64 {
    if lensum == 0 {
        return 100.0;
    }
    100.0 * (1.0 - dist as f64 / lensum as f64)
}

/// Token-set similarity on a 0..=100 scale.
///
/// Compares the shared tokens against each side's shared + leftover tokens,
/// so word order and duplicated words do not matter.
pub fn token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = token_set(a);
    let tb = token_set(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }

    let sect: Vec<&str> = ta.intersection(&tb).copied().collect();
    let diff_ab: Vec<&str> = ta.difference(&tb).copied().collect();
    let diff_ba: Vec<&str> = tb.difference(&ta).copied().collect();

    if !sect.is_empty() && (diff_ab.is_empty() || diff_ba.is_empty()) {
        return 100.0;
    }

    let diff_ab = join(&diff_ab);
    let diff_ba = join(&diff_ba);
    let ab_len = diff_ab.chars().count();
    let ba_len = diff_ba.chars().count();
    let sect_len = join(&sect).chars().count();
    let sep = usize::from(sect_len != 0);

    let sect_ab_len = sect_len + sep + ab_len;
    let sect_ba_len = sect_len + sep + ba_len;

    let result = norm_sim(indel_distance(&diff_ab, &diff_ba), sect_ab_len + sect_ba_len);
    if sect_len == 0 {
        return result;
    }

    let sect_ab = norm_sim(sep + ab_len, sect_len + sect_ab_len);
    let sect_ba = norm_sim(sep + ba_len, sect_len + sect_ba_len);
    result.max(sect_ab).max(sect_ba)
}

/// Best alignment of the shorter string against any same-length window of
/// the longer one (windows hanging off either edge included), 0..=100
pub fn partial_ratio(a: &str, b: &str) -> f64 {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (short, long) = if a.len() <= b.len() { (a, b) } else { (b, a) };

    if short.is_empty() {
        return if long.is_empty() { 100.0 } else { 0.0 };
    }

    let n = short.len();
    let m = long.len();
    let mut best: f64 = 0.0;

    for end in 1..n {
        best = best.max(chars_ratio(&short, &long[..end.min(m)]));
    }
    for start in 0..=(m - n) {
        best = best.max(chars_ratio(&short, &long[start..start + n]));
        if best >= 1.0 {
            return 100.0;
        }
    }
    for start in (m - n + 1)..m {
        best = best.max(chars_ratio(&short, &long[start..]));
    }

    best * 100.0
}

/// Like [`token_set_ratio`] but any shared token is a perfect score, and the
/// leftovers are compared with [`partial_ratio`], 0..=100
pub fn partial_token_set_ratio(a: &str, b: &str) -> f64 {
    let ta = token_set(a);
    let tb = token_set(b);
    if ta.is_empty() || tb.is_empty() {
        return 0.0;
    }
    if ta.intersection(&tb).next().is_some() {
        return 100.0;
    }

    let diff_ab: Vec<&str> = ta.difference(&tb).copied().collect();
    let diff_ba: Vec<&str> = tb.difference(&ta).copied().collect();
    partial_ratio(&join(&diff_ab), &join(&diff_ba))
}
