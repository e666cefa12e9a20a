//! Audio device resolution - map a spoken device name to a real endpoint
//!
//! Device lists are short, so every device is scored: the best of token-set
//! and partial token-set similarity, plus a bonus for trusted vendor/product
//! tokens, minus a penalty for generic driver words that cause false hits.

use std::collections::HashSet;

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::DeviceConfig;
use crate::fuzzy::{partial_token_set_ratio, token_set_ratio};
use crate::normalize::normalize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Input,
    Output,
    Unknown,
}

impl Capability {
    /// Output wins when a device can do both
    pub fn from_channels(max_output: u16, max_input: u16) -> Self {
        if max_output > 0 {
            Capability::Output
        } else if max_input > 0 {
            Capability::Input
        } else {
            Capability::Unknown
        }
    }
}

#[derive(Debug, Clone)]
pub struct Device {
    pub index: usize,
    pub name: String,
    pub normalized_name: String,
    pub capability: Capability,
}

impl Device {
    pub fn new(index: usize, name: impl Into<String>, capability: Capability) -> Self {
        let name = name.into();
        Self {
            index,
            normalized_name: normalize(&name),
            name,
            capability,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DeviceMatch {
    pub index: usize,
    pub name: String,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeviceMatchError {
    #[error("device query is empty")]
    EmptyQuery,
    #[error("no audio devices found")]
    NoDevices,
    #[error("no device similar enough (best was \"{best}\" at {score:.1})")]
    NoConfidentMatch { best: String, score: f64 },
}

#[derive(Debug, Clone)]
struct Bonus {
    tokens: Vec<String>,
    points: f64,
}

#[derive(Debug, Clone)]
pub struct DeviceResolver {
    threshold: f64,
    noise_tokens: HashSet<String>,
    noise_penalty: f64,
    bonuses: Vec<Bonus>,
}

impl DeviceResolver {
    pub fn new(config: &DeviceConfig) -> Self {
        Self {
            threshold: config.threshold,
            noise_tokens: config
                .noise_tokens
                .iter()
                .map(|t| normalize(t))
                .filter(|t| !t.is_empty())
                .collect(),
            noise_penalty: config.noise_penalty,
            bonuses: config
                .bonuses
                .iter()
                .map(|rule| Bonus {
                    tokens: rule.tokens.iter().map(|t| normalize(t)).collect(),
                    points: rule.points,
                })
                .collect(),
        }
    }

    /// Points added for trusted vendor/product tokens
    pub fn lexical_bonus(&self, name: &str) -> f64 {
        // Whole tokens only: "logitechg" does not earn the "logitech" bonus
        let tokens: HashSet<&str> = name.split_whitespace().collect();
        self.bonuses
            .iter()
            .filter(|b| !b.tokens.is_empty() && b.tokens.iter().all(|t| tokens.contains(t.as_str())))
            .map(|b| b.points)
            .sum()
    }

    /// Points removed when the name carries a generic driver/output word.
    /// Noise words match as token prefixes since normalization glues
    /// punctuated suffixes on ("Realtek(R)" becomes "realtekr").
    pub fn lexical_penalty(&self, name: &str) -> f64 {
        let noisy = name
            .split_whitespace()
            .any(|t| self.noise_tokens.iter().any(|n| t.starts_with(n.as_str())));
        if noisy {
            self.noise_penalty
        } else {
            0.0
        }
    }

    /// Score on a 0-100 scale (bonus can push it past 100)
    pub fn score(&self, query: &str, device: &Device) -> f64 {
        let name = device.normalized_name.as_str();
        let similarity = token_set_ratio(query, name).max(partial_token_set_ratio(query, name));
        similarity + self.lexical_bonus(name) - self.lexical_penalty(name)
    }

    /// Pick the output device best matching `query`
    pub fn resolve(&self, query: &str, devices: &[Device]) -> Result<DeviceMatch, DeviceMatchError> {
        if devices.is_empty() {
            return Err(DeviceMatchError::NoDevices);
        }
        let query = normalize(query);
        if query.is_empty() {
            return Err(DeviceMatchError::EmptyQuery);
        }

        let outputs: Vec<&Device> = devices
            .iter()
            .filter(|d| d.capability == Capability::Output)
            .collect();
        let candidates = if outputs.is_empty() {
            devices.iter().collect()
        } else {
            outputs
        };

        // Any shared token saturates the partial ratio, so equal scores fall
        // back to whole-name similarity, then enumeration order
        let mut best: Option<(&Device, f64, f64)> = None;
        for device in candidates {
            let score = self.score(&query, device);
            let overall = token_set_ratio(&query, &device.normalized_name);
            debug!(device = %device.name, score, overall, "scored audio device");
            let better = match best {
                None => true,
                Some((_, top, top_overall)) => {
                    score > top || (score == top && overall > top_overall)
                }
            };
            if better {
                best = Some((device, score, overall));
            }
        }

        let Some((device, score, _)) = best else {
            return Err(DeviceMatchError::NoDevices);
        };

        if score < self.threshold {
            info!(query = %query, best = %device.name, score, "no confident device match");
            return Err(DeviceMatchError::NoConfidentMatch {
                best: device.name.clone(),
                score,
            });
        }

        info!(query = %query, device = %device.name, score, "resolved audio device");
        Ok(DeviceMatch {
            index: device.index,
            name: device.name.clone(),
            score,
        })
    }
}

fn max_channels<I>(configs: Result<I, cpal::SupportedStreamConfigsError>) -> u16
where
    I: Iterator<Item = cpal::SupportedStreamConfigRange>,
{
    configs
        .map(|ranges| ranges.map(|r| r.channels()).max().unwrap_or(0))
        .unwrap_or(0)
}

/// Enumerate the audio devices of the default host, fresh on every call
pub fn enumerate_devices() -> Result<Vec<Device>> {
    let host = cpal::default_host();
    let mut devices = Vec::new();

    for (index, device) in host.devices()?.enumerate() {
        #[allow(deprecated)]
        let Ok(name) = device.name() else {
            continue;
        };
        if name.is_empty() {
            continue;
        }
        let capability = Capability::from_channels(
            max_channels(device.supported_output_configs()),
            max_channels(device.supported_input_configs()),
        );
        devices.push(Device::new(index, name, capability));
    }

    debug!(count = devices.len(), host = ?host.id(), "enumerated audio devices");
    Ok(devices)
}
