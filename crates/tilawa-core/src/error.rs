//! Playback error taxonomy.

use thiserror::Error;

use crate::domain::SessionState;
use crate::ports::ContentError;

/// Errors surfaced by recitation and playlist playback.
///
/// Every variant is terminal for the operation that produced it. Nothing in
/// the playback core retries on its own; the user restarts or changes the
/// selection.
#[derive(Debug, Clone, Error)]
pub enum PlaybackError {
    /// The media resource was unreachable or empty.
    #[error("Audio could not be loaded: {0}")]
    Transport(String),

    /// The media resource failed to decode or play.
    #[error("Audio could not be played: {0}")]
    MediaDecode(String),

    /// A playlist index outside the loaded track list.
    #[error("Track index {index} is out of range (playlist has {len} tracks)")]
    TrackOutOfBounds { index: usize, len: usize },

    /// The playlist has no tracks loaded.
    #[error("Playlist is empty")]
    EmptyPlaylist,

    /// The operation needs a session but none is active.
    #[error("No active playback session")]
    NoActiveSession,

    /// The operation is not valid in the current session state.
    #[error("Cannot {operation} while {state}")]
    InvalidState {
        operation: &'static str,
        state: SessionState,
    },

    /// The content provider failed to list tracks or resolve a URL.
    #[error(transparent)]
    Content(#[from] ContentError),
}

impl PlaybackError {
    /// Whether the error came from the network or the content provider.
    ///
    /// Used to decide whether a failure could be systemic (connectivity loss)
    /// rather than specific to one resource.
    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Content(ContentError::Unavailable(_)))
    }
}
