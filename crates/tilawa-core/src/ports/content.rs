//! Content provider port - track listing and audio URL resolution.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{ReciterId, Track, TrackId};

/// Errors returned by a [`ContentProvider`].
#[derive(Debug, Clone, Error)]
pub enum ContentError {
    /// The provider could not be reached.
    #[error("Content provider unavailable: {0}")]
    Unavailable(String),

    /// The reciter or track does not exist.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The provider answered with something unparseable.
    #[error("Invalid content response: {0}")]
    InvalidResponse(String),
}

/// Read-only access to playlist content.
///
/// Implementations may cache for the process lifetime; the playback core
/// does not require it.
#[async_trait]
pub trait ContentProvider: Send + Sync {
    /// Ordered track list for a reciter.
    async fn list_tracks(&self, reciter: &ReciterId) -> Result<Vec<Track>, ContentError>;

    /// Playable URL for one track under a reciter.
    async fn track_audio_url(
        &self,
        reciter: &ReciterId,
        track: TrackId,
    ) -> Result<String, ContentError>;
}
