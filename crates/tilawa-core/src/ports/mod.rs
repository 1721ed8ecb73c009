//! Port definitions (trait abstractions) for external collaborators.
//!
//! Ports define the interfaces the playback core expects from the platform
//! and from remote services. They contain no transport details and use only
//! domain types.
//!
//! # Design Rules
//!
//! - No `reqwest` types in any signature
//! - No audio decoding: media resources are opaque
//! - Every fallible call resolves to a discriminated `Result`

pub mod content;
pub mod event_emitter;
pub mod health_probe;
pub mod media;
pub mod synthesis;

pub use content::{ContentError, ContentProvider};
pub use event_emitter::{ChannelEmitter, NoopEmitter, PlaybackEventEmitter};
pub use health_probe::{HealthProbe, ProbeError};
pub use media::{
    ListenerGuard, MediaBackend, MediaEvent, MediaFailure, MediaListener, MediaResource,
    MediaSignal,
};
pub use synthesis::{SpeechAudio, SynthesisProvider, SynthesisProviderError};
