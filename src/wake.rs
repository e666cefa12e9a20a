//! Wake phrase detection over a stream of transcribed fragments
//!
//! Speech recognizers often split a phrase across two results ("ola" then
//! "jarvis") or mishear a letter ("jarbis"). The spotter keeps a short
//! rolling buffer of recent fragments and checks it for the phrase, first
//! exactly and then fuzzily against a few candidate windows.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::config::WakeConfig;
use crate::fuzzy::ratio;
use crate::normalize::normalize;

/// Stateful wake phrase spotter. Not meant for concurrent use: feed it from
/// a single listening loop.
#[derive(Debug)]
pub struct WakePhraseSpotter {
    phrase: String,
    token_count: usize,
    window: Duration,
    cooldown: Duration,
    max_buffer_chars: usize,
    threshold: f64,
    char_window_slack: usize,
    buffer: String,
    last_update: Option<Instant>,
    last_trigger: Option<Instant>,
}

impl WakePhraseSpotter {
    pub fn new(config: &WakeConfig) -> Self {
        let phrase = normalize(&config.phrase);
        Self {
            token_count: phrase.split_whitespace().count(),
            phrase,
            window: Duration::try_from_secs_f64(config.window_secs).unwrap_or_default(),
            cooldown: Duration::try_from_secs_f64(config.cooldown_secs).unwrap_or_default(),
            max_buffer_chars: config.max_buffer_chars,
            threshold: config.threshold,
            char_window_slack: config.char_window_slack,
            buffer: String::new(),
            last_update: None,
            last_trigger: None,
        }
    }

    /// Spotter with default timings for the given phrase
    pub fn with_phrase(phrase: &str) -> Self {
        Self::new(&WakeConfig {
            phrase: phrase.to_string(),
            ..WakeConfig::default()
        })
    }

    /// Normalized wake phrase
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Current rolling buffer contents
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    /// Feed one transcribed fragment, returns true when the wake phrase fired
    pub fn check(&mut self, fragment: &str) -> bool {
        self.check_at(fragment, Instant::now())
    }

    /// Same as [`check`](Self::check) with an explicit arrival time
    pub fn check_at(&mut self, fragment: &str, now: Instant) -> bool {
        if fragment.is_empty() || self.phrase.is_empty() {
            return false;
        }

        // Residual audio right after a trigger must not fire again
        if let Some(last) = self.last_trigger
            && now.saturating_duration_since(last) < self.cooldown
        {
            return false;
        }

        self.push(&normalize(fragment), now);

        if self.buffer.contains(self.phrase.as_str()) {
            debug!(buffer = %self.buffer, "wake phrase matched exactly");
            self.trigger(now);
            return true;
        }

        if let Some((candidate, score)) = self.best_fuzzy_candidate() {
            debug!(
                candidate = %candidate,
                ratio = score,
                threshold = self.threshold,
                "wake phrase matched by similarity"
            );
            self.trigger(now);
            return true;
        }

        false
    }

    fn push(&mut self, fragment: &str, now: Instant) {
        let stale = match self.last_update {
            Some(last) => now.saturating_duration_since(last) > self.window,
            None => true,
        };

        if stale {
            self.buffer = fragment.to_string();
        } else {
            let joined = format!("{} {}", self.buffer, fragment);
            self.buffer = joined.trim().to_string();
        }

        // Normalized text is ASCII, so byte offsets are char offsets
        if self.buffer.len() > self.max_buffer_chars {
            let cut = self.buffer.len() - self.max_buffer_chars;
            self.buffer.drain(..cut);
        }

        self.last_update = Some(now);
    }

    fn trigger(&mut self, now: Instant) {
        self.last_trigger = Some(now);
        self.buffer.clear();
        self.last_update = None;
    }

    /// Windows of the buffer tail worth comparing with the phrase
    fn candidates(&self) -> Vec<&str> {
        let mut candidates = Vec::new();

        let tokens: Vec<(usize, &str)> = self
            .buffer
            .split(' ')
            .scan(0usize, |offset, tok| {
                let start = *offset;
                *offset += tok.len() + 1;
                Some((start, tok))
            })
            .filter(|(_, tok)| !tok.is_empty())
            .collect();

        for k in [self.token_count, self.token_count + 1] {
            if k > 0 && tokens.len() >= k {
                let start = tokens[tokens.len() - k].0;
                candidates.push(&self.buffer[start..]);
            }
        }

        let phrase_len = self.phrase.len();
        let tail_len = self.buffer.len().min(phrase_len + self.char_window_slack);
        let tail = &self.buffer[self.buffer.len() - tail_len..];
        if !tail.is_empty() {
            if tail.len() >= phrase_len {
                for i in 0..=(tail.len() - phrase_len) {
                    candidates.push(&tail[i..i + phrase_len]);
                }
            } else {
                candidates.push(tail);
            }
        }

        candidates
    }

    fn best_fuzzy_candidate(&self) -> Option<(String, f64)> {
        self.candidates()
            .into_iter()
            .map(|c| (c, ratio(&self.phrase, c)))
            .find(|(_, score)| *score >= self.threshold)
            .map(|(c, score)| (c.to_string(), score))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(base: Instant, secs: f64) -> Instant {
        base + Duration::from_secs_f64(secs)
    }

    #[test]
    fn test_exact_match() {
        let mut spotter = WakePhraseSpotter::with_phrase("Olá Jarvis");
        let t0 = Instant::now();
        assert!(spotter.check_at("hey ola jarvis open chrome", t0));
        assert!(spotter.buffer().is_empty());
    }

    #[test]
    fn test_empty_fragment_is_noop() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        let t0 = Instant::now();
        assert!(!spotter.check_at("ola", t0));
        assert!(!spotter.check_at("", at(t0, 0.5)));
        assert_eq!(spotter.buffer(), "ola");
        assert!(spotter.check_at("jarvis", at(t0, 1.0)));
    }

    #[test]
    fn test_split_within_window() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        let t0 = Instant::now();
        assert!(!spotter.check_at("ola", t0));
        assert!(spotter.check_at("jarvis", at(t0, 2.0)));
    }

    #[test]
    fn test_split_outside_window() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        let t0 = Instant::now();
        assert!(!spotter.check_at("ola", t0));
        assert!(!spotter.check_at("jarvis", at(t0, 3.0)));
        assert_eq!(spotter.buffer(), "jarvis");
    }

    #[test]
    fn test_cooldown() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        let t0 = Instant::now();
        assert!(spotter.check_at("ola jarvis", t0));
        assert!(!spotter.check_at("ola jarvis", at(t0, 1.0)));
        assert!(spotter.check_at("ola jarvis", at(t0, 1.6)));
    }

    #[test]
    fn test_fuzzy_substitution() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        assert!(spotter.check_at("ola jarbis", Instant::now()));
    }

    #[test]
    fn test_fuzzy_rejects_distant() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        assert!(!spotter.check_at("hola garbage", Instant::now()));
        assert!(!spotter.check_at("olga chavez", Instant::now()));
    }

    #[test]
    fn test_buffer_bounded() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        let t0 = Instant::now();
        for i in 0..100 {
            spotter.check_at("some unrelated chatter here", at(t0, i as f64 * 0.1));
            assert!(spotter.buffer().len() <= 120);
        }
        assert_eq!(spotter.buffer().len(), 120);
    }

    #[test]
    fn test_long_first_fragment_bounded() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        let long = "blah ".repeat(60);
        assert!(!spotter.check_at(&long, Instant::now()));
        assert!(spotter.buffer().len() <= 120);
    }

    #[test]
    fn test_empty_phrase_never_triggers() {
        let mut spotter = WakePhraseSpotter::with_phrase("?!");
        assert!(!spotter.check_at("anything at all", Instant::now()));
        assert!(!spotter.check_at("?!", Instant::now()));
    }

    #[test]
    fn test_candidates_include_token_and_char_windows() {
        let mut spotter = WakePhraseSpotter::with_phrase("ola jarvis");
        spotter.buffer = "well then ola jarvix".to_string();
        let candidates = spotter.candidates();
        assert_eq!(candidates[0], "ola jarvix");
        assert_eq!(candidates[1], "then ola jarvix");
        // tail is the last 18 chars, sliced into 9 windows of 10
        assert_eq!(candidates.len(), 2 + 9);
        assert!(candidates.iter().skip(2).all(|c| c.len() == 10));
    }
}
