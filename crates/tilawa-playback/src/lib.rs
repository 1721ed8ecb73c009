//! Recitation playback for tilawa.
//!
//! - [`PlaybackRegistry`] - the one shared record of which session is audible
//! - [`AudioSessionController`] - lifecycle of a single media resource
//! - [`PlaylistController`] - reciter playlists with auto-advance
//!
//! Controllers are single-owner state machines. The platform reports media
//! activity through a session-scoped listener that queues events; callers
//! pump that queue with `drain`, `process_next_event` or `next_outcome`.

#![deny(unused_crate_dependencies)]

pub mod playlist;
pub mod registry;
pub mod session;

pub use playlist::{PlaylistController, PlaylistStep};
pub use registry::{Autoplay, PlaybackHandle, PlaybackRegistry};
pub use session::{AudioSessionController, CompletionHook, SessionOutcome};

// Silence unused dev-dependency warnings
#[cfg(test)]
use tokio_test as _;
