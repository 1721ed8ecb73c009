//! Core domain types, events and port definitions for tilawa.
//!
//! tilawa coordinates three kinds of audio that compete for the user's ear:
//! per-verse recitation, a continuous reciter playlist, and synthesized
//! speech for translations. This crate holds what they share:
//!
//! - [`domain`] - verse keys, reciters, tracks, session ids and states
//! - [`events`] - the [`PlaybackEvent`] union observed by the UI layer
//! - [`ports`] - traits for the platform media backend and remote services
//! - [`settings`] - configuration with defaults and validation
//!
//! Enable the `test-utils` feature for scripted fakes of every port.

#![deny(unused_crate_dependencies)]

pub mod domain;
pub mod error;
pub mod events;
pub mod ports;
pub mod settings;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

// Re-export commonly used types for convenience
pub use domain::{
    ControllerId, ReciterId, SessionId, SessionSequence, SessionState, SourceKey, SynthesisState,
    Track, TrackId, VerseKey, VerseKeyError,
};
pub use error::PlaybackError;
pub use events::PlaybackEvent;
pub use ports::{
    ChannelEmitter, ContentError, ContentProvider, HealthProbe, ListenerGuard, MediaBackend,
    MediaEvent, MediaFailure, MediaListener, MediaResource, MediaSignal, NoopEmitter,
    PlaybackEventEmitter, ProbeError, SpeechAudio, SynthesisProvider, SynthesisProviderError,
};
pub use settings::{Settings, SettingsError, validate_settings};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
