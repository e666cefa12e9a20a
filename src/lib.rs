//! Approximate matching for a voice-driven desktop assistant
//!
//! Turns noisy speech-recognition text into exact targets: a wake phrase
//! spotted across fragments, an executable path found from a loose program
//! name, and an audio device picked from a loose device name.

pub mod config;
pub mod device;
pub mod exe;
pub mod fuzzy;
pub mod normalize;
pub mod wake;

pub use config::Config;
pub use device::{Capability, Device, DeviceMatch, DeviceMatchError, DeviceResolver};
pub use exe::{ExecutableResolver, ScoredCandidate, Search};
pub use normalize::normalize;
pub use wake::WakePhraseSpotter;
