//! Candidate scoring for the executable search
//!
//! A candidate's score is a weighted mix of name similarity signals plus an
//! unweighted adjustment from the shape of its path (system folders,
//! installers and version directories count against it; folders named
//! after the target count for it).

use std::path::{Component, Path};
use std::sync::LazyLock;

use regex::Regex;

use crate::config::ExecutableConfig;
use crate::fuzzy::{ratio, token_overlap};
use crate::normalize::normalize;

const W_SEQ: f64 = 0.40;
const W_TOKEN: f64 = 0.25;
const W_EXACT: f64 = 0.25;
const W_SUBSTR: f64 = 0.05;
const W_ALL_IN_BASE: f64 = 0.15;
const W_ALL_IN_PATH: f64 = 0.10;

const SYSTEM_PENALTY: f64 = -0.10;
const GENERIC_FOLDER_PENALTY: f64 = -0.05;
const INSTALLER_PENALTY: f64 = -0.15;
const VERSION_PENALTY: f64 = -0.05;
const FOLDER_BOOST: f64 = 0.15;
const PARENT_BOOST: f64 = 0.10;
const FULL_PATH_BOOST: f64 = 0.20;
const INSTALL_ROOT_BOOST: f64 = 0.05;

static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"/\d+\.\d+\.\d+").expect("version pattern compiles"));

/// Normalized application name being searched for
#[derive(Debug, Clone)]
pub struct Target {
    pub normalized: String,
    pub tokens: Vec<String>,
}

impl Target {
    /// Build from free text, dropping a trailing `.{extension}`
    pub fn new(name: &str, extension: &str) -> Self {
        let normalized = normalize(strip_extension(name.trim(), extension));
        let tokens = normalized.split_whitespace().map(String::from).collect();
        Self { normalized, tokens }
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Tokens long enough to carry meaning on their own
    fn significant(&self) -> impl Iterator<Item = &str> {
        self.tokens.iter().map(String::as_str).filter(|t| t.len() > 2)
    }
}

fn strip_extension<'a>(name: &'a str, extension: &str) -> &'a str {
    if extension.is_empty() {
        return name;
    }
    let suffix_len = extension.len() + 1;
    if name.len() >= suffix_len && name.is_char_boundary(name.len() - suffix_len) {
        let (stem, suffix) = name.split_at(name.len() - suffix_len);
        if suffix.starts_with('.') && suffix[1..].eq_ignore_ascii_case(extension) {
            return stem;
        }
    }
    name
}

/// Individual contributions behind a candidate's score
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Signals {
    pub seq: f64,
    pub token: f64,
    pub exact: bool,
    pub substr: bool,
    pub all_in_base: bool,
    pub all_in_path: bool,
    pub context: f64,
}

impl Signals {
    pub fn total(&self) -> f64 {
        self.seq * W_SEQ
            + self.token * W_TOKEN
            + f64::from(u8::from(self.exact)) * W_EXACT
            + f64::from(u8::from(self.substr)) * W_SUBSTR
            + f64::from(u8::from(self.all_in_base)) * W_ALL_IN_BASE
            + f64::from(u8::from(self.all_in_path)) * W_ALL_IN_PATH
            + self.context
    }

    /// Named values, for display
    pub fn entries(&self) -> [(&'static str, f64); 7] {
        let flag = |b: bool| f64::from(u8::from(b));
        [
            ("seq", self.seq),
            ("token", self.token),
            ("exact", flag(self.exact)),
            ("substr", flag(self.substr)),
            ("all_in_base", flag(self.all_in_base)),
            ("all_in_path", flag(self.all_in_path)),
            ("context", self.context),
        ]
    }
}

/// Lowercase path words used by the context adjustment
#[derive(Debug, Clone)]
pub struct PathRules {
    system_patterns: Vec<String>,
    generic_folders: Vec<String>,
    installer_markers: Vec<String>,
    install_roots: Vec<String>,
    vendor_markers: Vec<String>,
}

fn lowered(items: &[String]) -> Vec<String> {
    items.iter().map(|s| s.to_lowercase()).collect()
}

impl PathRules {
    pub fn new(config: &ExecutableConfig) -> Self {
        Self {
            system_patterns: lowered(&config.system_patterns),
            generic_folders: lowered(&config.generic_folders),
            installer_markers: lowered(&config.installer_markers),
            install_roots: lowered(&config.install_roots),
            vendor_markers: lowered(&config.vendor_markers),
        }
    }

    /// Additive adjustment from where the file lives
    pub fn context(&self, path: &Path, target: &Target) -> f64 {
        let path_lower = path.to_string_lossy().to_lowercase().replace('\\', "/");
        let folder = dir_name(path.parent());
        let parent = dir_name(path.parent().and_then(Path::parent));

        let in_folder = target.significant().any(|t| folder.contains(t));
        let in_parent = target.significant().any(|t| parent.contains(t));
        let contains_any = |words: &[String]| words.iter().any(|w| path_lower.contains(w.as_str()));

        let mut adjustment = 0.0;

        if contains_any(&self.system_patterns) {
            adjustment += SYSTEM_PENALTY;
        }
        if self.generic_folders.iter().any(|g| *g == folder) {
            adjustment += GENERIC_FOLDER_PENALTY;
        }
        if contains_any(&self.installer_markers) {
            adjustment += INSTALLER_PENALTY;
        }
        if VERSION_SEGMENT.is_match(&path_lower) {
            adjustment += VERSION_PENALTY;
        }
        if in_folder {
            adjustment += FOLDER_BOOST;
        }
        if in_parent {
            adjustment += PARENT_BOOST;
        }
        if target.significant().all(|t| path_lower.contains(t)) {
            adjustment += FULL_PATH_BOOST;
        }
        if contains_any(&self.install_roots)
            && !contains_any(&self.vendor_markers)
            && (in_folder || in_parent)
        {
            adjustment += INSTALL_ROOT_BOOST;
        }

        adjustment
    }

    /// Score one discovered executable against the target
    pub fn score(&self, path: &Path, target: &Target, extension: &str) -> Signals {
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_default();
        let base = normalize(strip_extension(&file_name, extension));
        let folder = folder_words(path.parent());
        let base_and_folder = format!("{base} {folder}");
        let wanted = target.normalized.as_str();

        Signals {
            seq: ratio(wanted, &base),
            token: token_overlap(wanted, &base_and_folder),
            exact: wanted == base,
            substr: wanted.contains(base.as_str()) || base.contains(wanted),
            all_in_base: target.significant().all(|t| base.contains(t)),
            all_in_path: target.significant().all(|t| base_and_folder.contains(t)),
            context: self.context(path, target),
        }
    }
}

fn dir_name(dir: Option<&Path>) -> String {
    dir.and_then(Path::file_name)
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

/// Normalized words of every folder above the file
fn folder_words(dir: Option<&Path>) -> String {
    let Some(dir) = dir else {
        return String::new();
    };
    let joined = dir
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => Some(part.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join(" ");
    normalize(&joined)
}
