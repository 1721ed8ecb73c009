//! Synthesized speech for tilawa translations.
//!
//! - [`SpeechSynthesisController`] - single-flight synthesis per controller
//! - [`HealthMonitor`] - optimistic provider health with one debounced retry
//! - [`ScheduledTask`] - cancellable one-shot timer used for retries
//!
//! Synthesis runs independently of recitation playback: a verse may be
//! recited while the translation of the next verse is being synthesized.

#![deny(unused_crate_dependencies)]

pub mod error;
pub mod health;
pub mod schedule;
pub mod synthesis;

pub use error::SynthesisError;
pub use health::HealthMonitor;
pub use schedule::ScheduledTask;
pub use synthesis::{SpeechSynthesisController, SynthesisControl, SynthesisSession};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tilawa_playback as _;
#[cfg(test)]
use tokio_test as _;
