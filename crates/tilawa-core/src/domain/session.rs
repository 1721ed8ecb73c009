//! Session identity and lifecycle states.
//!
//! A [`SessionId`] identifies *which attempt* is playing. Sequence numbers
//! grow monotonically per controller, and the controller id makes the pair
//! unique across the process, so two controllers never share a session id.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identity of one controller instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ControllerId(Uuid);

impl ControllerId {
    /// Allocate a fresh controller id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ControllerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ControllerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // First block of the uuid is enough to tell controllers apart in logs.
        let id = self.0.simple().to_string();
        f.write_str(&id[..8])
    }
}

/// Token identifying one playback or synthesis attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId {
    pub controller: ControllerId,
    pub seq: u64,
}

impl SessionId {
    #[must_use]
    pub const fn new(controller: ControllerId, seq: u64) -> Self {
        Self { controller, seq }
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.controller, self.seq)
    }
}

/// Per-controller allocator of monotonically increasing session ids.
#[derive(Debug, Clone)]
pub struct SessionSequence {
    controller: ControllerId,
    last: u64,
}

impl SessionSequence {
    #[must_use]
    pub fn new() -> Self {
        Self {
            controller: ControllerId::new(),
            last: 0,
        }
    }

    #[must_use]
    pub const fn controller(&self) -> ControllerId {
        self.controller
    }

    /// Allocate the next session id.
    pub const fn next_id(&mut self) -> SessionId {
        self.last += 1;
        SessionId::new(self.controller, self.last)
    }
}

impl Default for SessionSequence {
    fn default() -> Self {
        Self::new()
    }
}

/// Lifecycle state of an audio session.
///
/// ```text
///   Idle → Loading → Playing → {Paused, Ended, Error} → Idle (after teardown)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No resource attached.
    #[default]
    Idle,
    /// Resource created, buffering until ready.
    Loading,
    /// Audible.
    Playing,
    /// Paused by the user, by the platform, or by eviction.
    Paused,
    /// Reached the natural end of the media.
    Ended,
    /// Failed to load or play; terminal until restarted.
    Error,
}

impl SessionState {
    /// Whether a seek is meaningful in this state.
    #[must_use]
    pub const fn is_seekable(self) -> bool {
        matches!(self, Self::Playing | Self::Paused)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Loading => "loading",
            Self::Playing => "playing",
            Self::Paused => "paused",
            Self::Ended => "ended",
            Self::Error => "error",
        };
        f.write_str(label)
    }
}

/// Lifecycle state of a synthesized-speech session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SynthesisState {
    /// Provider call in flight.
    Requesting,
    /// Buffer available; the caller may be playing it.
    Ready,
    /// Playback finished naturally.
    Completed,
    /// Cancelled explicitly or superseded by a newer request.
    Cancelled,
    /// Provider call failed.
    Failed,
}

impl SynthesisState {
    /// Whether the session can no longer change state.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_is_monotonic_and_scoped_to_controller() {
        let mut a = SessionSequence::new();
        let mut b = SessionSequence::new();

        let a1 = a.next_id();
        let a2 = a.next_id();
        let b1 = b.next_id();

        assert!(a2.seq > a1.seq);
        assert_eq!(a1.seq, b1.seq);
        assert_ne!(a1, b1, "same seq on different controllers must differ");
    }

    #[test]
    fn seekable_states() {
        assert!(SessionState::Playing.is_seekable());
        assert!(SessionState::Paused.is_seekable());
        assert!(!SessionState::Loading.is_seekable());
        assert!(!SessionState::Ended.is_seekable());
    }

    #[test]
    fn session_state_serializes_lowercase() {
        let json = serde_json::to_string(&SessionState::Playing).unwrap();
        assert_eq!(json, "\"playing\"");
    }

    #[test]
    fn terminal_synthesis_states() {
        assert!(!SynthesisState::Requesting.is_terminal());
        assert!(!SynthesisState::Ready.is_terminal());
        assert!(SynthesisState::Completed.is_terminal());
        assert!(SynthesisState::Cancelled.is_terminal());
    }
}
