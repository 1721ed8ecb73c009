//! Canonical event union for everything the UI layer observes.
//!
//! Controllers never call UI code directly; they emit [`PlaybackEvent`]s
//! through a [`PlaybackEventEmitter`](crate::ports::PlaybackEventEmitter).
//!
//! # Wire Format
//!
//! Events are serialized with a `type` tag:
//!
//! ```json
//! { "type": "progress", "session": { ... }, "currentTime": 12.5, "duration": 300.0 }
//! ```

use serde::{Deserialize, Serialize};

use crate::domain::{ControllerId, ReciterId, SessionId, SessionState, SynthesisState};

/// Canonical playback events.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlaybackEvent {
    // ========== Session Events ==========
    /// An audio session changed state.
    StateChanged {
        session: SessionId,
        state: SessionState,
    },

    /// Playback position update for an audio session.
    Progress {
        session: SessionId,
        /// Current position in seconds.
        #[serde(rename = "currentTime")]
        current_time: f64,
        /// Total duration in seconds, if known.
        duration: Option<f64>,
    },

    /// A user-visible failure of an audio session.
    SessionError {
        session: Option<SessionId>,
        message: String,
    },

    // ========== Playlist Events ==========
    /// The playlist moved to a new track automatically.
    PlaylistAdvance { index: usize },

    /// The last track of the playlist ended.
    PlaylistComplete { reciter: ReciterId },

    // ========== Synthesis Events ==========
    /// A synthesized-speech session changed state.
    SynthesisStateChanged {
        controller: ControllerId,
        request: u64,
        state: SynthesisState,
    },

    // ========== Health Events ==========
    /// The synthesis provider's availability changed.
    HealthChanged { healthy: bool },
}

impl PlaybackEvent {
    /// Create a state-change event.
    #[must_use]
    pub const fn state_changed(session: SessionId, state: SessionState) -> Self {
        Self::StateChanged { session, state }
    }

    /// Create a progress event.
    #[must_use]
    pub const fn progress(session: SessionId, current_time: f64, duration: Option<f64>) -> Self {
        Self::Progress {
            session,
            current_time,
            duration,
        }
    }

    /// Create a session error event.
    pub fn session_error(session: Option<SessionId>, message: impl Into<String>) -> Self {
        Self::SessionError {
            session,
            message: message.into(),
        }
    }

    /// Short event name, used as a log field.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::StateChanged { .. } => "state_changed",
            Self::Progress { .. } => "progress",
            Self::SessionError { .. } => "session_error",
            Self::PlaylistAdvance { .. } => "playlist_advance",
            Self::PlaylistComplete { .. } => "playlist_complete",
            Self::SynthesisStateChanged { .. } => "synthesis_state_changed",
            Self::HealthChanged { .. } => "health_changed",
        }
    }
}
