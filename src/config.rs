use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub wake: WakeConfig,
    #[serde(default)]
    pub executables: ExecutableConfig,
    #[serde(default)]
    pub devices: DeviceConfig,
}

// ============================================================================
// Wake Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct WakeConfig {
    /// Phrase that activates command listening
    #[serde(default = "default_wake_phrase")]
    pub phrase: String,
    /// Fragments further apart than this start a new utterance
    #[serde(default = "default_window_secs")]
    pub window_secs: f64,
    /// Minimum time between two triggers
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: f64,
    /// Rolling buffer size, in characters
    #[serde(default = "default_max_buffer_chars")]
    pub max_buffer_chars: usize,
    /// Similarity ratio needed for a fuzzy trigger
    #[serde(default = "default_wake_threshold")]
    pub threshold: f64,
    /// Extra characters of buffer tail scanned by the sliding window
    #[serde(default = "default_char_window_slack")]
    pub char_window_slack: usize,
}

impl Default for WakeConfig {
    fn default() -> Self {
        Self {
            phrase: default_wake_phrase(),
            window_secs: default_window_secs(),
            cooldown_secs: default_cooldown_secs(),
            max_buffer_chars: default_max_buffer_chars(),
            threshold: default_wake_threshold(),
            char_window_slack: default_char_window_slack(),
        }
    }
}

fn default_wake_phrase() -> String {
    "ola jarvis".into()
}
fn default_window_secs() -> f64 {
    2.5
}
fn default_cooldown_secs() -> f64 {
    1.5
}
fn default_max_buffer_chars() -> usize {
    120
}
fn default_wake_threshold() -> f64 {
    0.84
}
fn default_char_window_slack() -> usize {
    8
}

// ============================================================================
// Executable Search Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct ExecutableConfig {
    /// Executable file extension, without the dot
    #[serde(default = "default_extension")]
    pub extension: String,
    /// Deepest directory level searched below each root
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Search roots; empty means every drive root
    #[serde(default)]
    pub roots: Vec<PathBuf>,
    /// Give up traversal after this many seconds and rank what was found
    #[serde(default)]
    pub timeout_secs: Option<f64>,
    /// Walk each root on its own thread
    #[serde(default = "default_parallel")]
    pub parallel: bool,
    /// Path fragments of OS and installer areas (matched with `/` separators)
    #[serde(default = "default_system_patterns")]
    pub system_patterns: Vec<String>,
    /// Catch-all folder names that say nothing about the program
    #[serde(default = "default_generic_folders")]
    pub generic_folders: Vec<String>,
    /// Words marking installers, redistributables and helpers
    #[serde(default = "default_installer_markers")]
    pub installer_markers: Vec<String>,
    /// General application install roots
    #[serde(default = "default_install_roots")]
    pub install_roots: Vec<String>,
    /// Words that mark an install root entry as OS vendor territory
    #[serde(default = "default_vendor_markers")]
    pub vendor_markers: Vec<String>,
}

impl Default for ExecutableConfig {
    fn default() -> Self {
        Self {
            extension: default_extension(),
            max_depth: default_max_depth(),
            roots: Vec::new(),
            timeout_secs: None,
            parallel: default_parallel(),
            system_patterns: default_system_patterns(),
            generic_folders: default_generic_folders(),
            installer_markers: default_installer_markers(),
            install_roots: default_install_roots(),
            vendor_markers: default_vendor_markers(),
        }
    }
}

fn default_extension() -> String {
    "exe".into()
}
fn default_max_depth() -> usize {
    6
}
fn default_parallel() -> bool {
    true
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn default_system_patterns() -> Vec<String> {
    strings(&[
        "windows/system32",
        "windows/syswow64",
        "windows/winsxs",
        "/installer/",
        "/redistributables/",
        "/support/",
    ])
}
fn default_generic_folders() -> Vec<String> {
    strings(&[
        "bin",
        "exe",
        "executables",
        "apps",
        "applications",
        "tools",
        "utilities",
    ])
}
fn default_installer_markers() -> Vec<String> {
    strings(&["redistributable", "installer", "setup", "support", "helper"])
}
fn default_install_roots() -> Vec<String> {
    strings(&["program files"])
}
fn default_vendor_markers() -> Vec<String> {
    strings(&["windows", "microsoft", "system32"])
}

// ============================================================================
// Audio Device Config
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct DeviceConfig {
    /// Minimum score (0-100 scale) for a confident match
    #[serde(default = "default_device_threshold")]
    pub threshold: f64,
    /// Tokens typical of generic or driver-level endpoints; each matches any
    /// normalized name token it prefixes ("realtek" catches "realtekr")
    #[serde(default = "default_noise_tokens")]
    pub noise_tokens: Vec<String>,
    /// Points subtracted when any noise token is present
    #[serde(default = "default_noise_penalty")]
    pub noise_penalty: f64,
    /// Trusted vendor/product token combinations
    #[serde(default = "default_bonuses")]
    pub bonuses: Vec<BonusRule>,
}

/// Awards `points` when every token is present in a device name, each as a
/// whole token
#[derive(Debug, Clone, Deserialize)]
pub struct BonusRule {
    pub tokens: Vec<String>,
    pub points: f64,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            threshold: default_device_threshold(),
            noise_tokens: default_noise_tokens(),
            noise_penalty: default_noise_penalty(),
            bonuses: default_bonuses(),
        }
    }
}

fn default_device_threshold() -> f64 {
    60.0
}
fn default_noise_tokens() -> Vec<String> {
    strings(&[
        "driver", "primary", "primario", "default", "digital", "output", "saida", "spdif",
        "realtek",
    ])
}
fn default_noise_penalty() -> f64 {
    5.0
}
fn default_bonuses() -> Vec<BonusRule> {
    vec![
        BonusRule {
            tokens: strings(&["logitech"]),
            points: 5.0,
        },
        BonusRule {
            tokens: strings(&["pro", "x"]),
            points: 5.0,
        },
    ]
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if !path.exists() {
            return Config::default();
        }
        Self::from_path(path).unwrap_or_else(|e| {
            warn!("Ignoring {}: {:#}", path.display(), e);
            Config::default()
        })
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::from_toml(&text).with_context(|| format!("parsing {}", path.display()))
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}
