//! Reciter playlist on top of a single [`AudioSessionController`].
//!
//! The playlist owns its session controller and resolves track URLs through
//! a [`ContentProvider`]. A natural end advances to the next track; an error
//! never does, so a connectivity loss cannot skip through the rest of the
//! list.

use std::sync::Arc;

use tilawa_core::{
    ContentProvider, MediaEvent, PlaybackError, PlaybackEvent, PlaybackEventEmitter, ReciterId,
    SessionId, SessionState, SourceKey, Track,
};
use tracing::{debug, info, warn};

use crate::session::{AudioSessionController, SessionOutcome};

/// What the playlist did in response to a media event.
#[derive(Debug, Clone)]
pub enum PlaylistStep {
    /// Nothing playlist-level happened.
    Continue,
    /// The previous track ended and the next one was started.
    Advanced { index: usize, session: SessionId },
    /// The last track ended. The session stays `Ended`.
    Completed,
    /// The session failed; auto-advance is suppressed.
    Halted(PlaybackError),
    /// The track ended but the next one could not be started.
    AdvanceFailed { index: usize, error: PlaybackError },
}

/// Ordered tracks of one reciter, played one after another.
pub struct PlaylistController {
    session: AudioSessionController,
    content: Arc<dyn ContentProvider>,
    emitter: Arc<dyn PlaybackEventEmitter>,
    reciter: ReciterId,
    tracks: Vec<Track>,
    current_index: usize,
    /// Reciter of the track currently loaded into the session.
    playing_reciter: Option<ReciterId>,
}

impl PlaylistController {
    pub fn new(
        session: AudioSessionController,
        content: Arc<dyn ContentProvider>,
        emitter: Arc<dyn PlaybackEventEmitter>,
        reciter: ReciterId,
    ) -> Self {
        Self {
            session,
            content,
            emitter,
            reciter,
            tracks: Vec::new(),
            current_index: 0,
            playing_reciter: None,
        }
    }

    #[must_use]
    pub const fn reciter(&self) -> &ReciterId {
        &self.reciter
    }

    #[must_use]
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    #[must_use]
    pub const fn current_index(&self) -> usize {
        self.current_index
    }

    #[must_use]
    pub const fn session(&self) -> &AudioSessionController {
        &self.session
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.session.state()
    }

    /// Fetch the track list of the selected reciter.
    ///
    /// The current index is reset when it no longer fits the new list.
    pub async fn load_tracks(&mut self) -> Result<usize, PlaybackError> {
        let tracks = self.content.list_tracks(&self.reciter).await?;
        debug!(reciter = %self.reciter, count = tracks.len(), "Loaded playlist tracks");
        self.set_tracks(tracks);
        Ok(self.tracks.len())
    }

    /// Replace the track list without touching playback.
    pub fn set_tracks(&mut self, tracks: Vec<Track>) {
        self.tracks = tracks;
        if self.current_index >= self.tracks.len() {
            self.current_index = 0;
        }
    }

    /// Change the reciter used by subsequent [`play`](Self::play) calls.
    ///
    /// Current playback continues undisturbed.
    pub fn select_reciter(&mut self, reciter: ReciterId) {
        debug!(from = %self.reciter, to = %reciter, "Reciter selected");
        self.reciter = reciter;
    }

    /// Move the cursor to `index` without starting playback.
    pub fn select_track(&mut self, index: usize) -> Result<(), PlaybackError> {
        self.check_bounds(index)?;
        self.current_index = index;
        Ok(())
    }

    /// Resolve and start the track at `index`.
    ///
    /// The cursor moves only once the session has started; a failed play
    /// leaves it on the track that is still loaded.
    pub async fn play(&mut self, index: usize) -> Result<SessionId, PlaybackError> {
        self.check_bounds(index)?;

        let reciter = self.reciter.clone();
        let track = self.tracks[index].id;
        let url = match self.content.track_audio_url(&reciter, track).await {
            Ok(url) => url,
            Err(e) => {
                let error = PlaybackError::from(e);
                warn!(%reciter, track = track.0, error = %error, "Could not resolve track audio");
                self.emitter.emit(PlaybackEvent::session_error(
                    self.session.current_session(),
                    error.to_string(),
                ));
                return Err(error);
            }
        };

        let source = SourceKey::Track {
            reciter: reciter.clone(),
            track,
        };
        let session = self.session.start(source, url)?;
        self.current_index = index;
        self.playing_reciter = Some(reciter);
        Ok(session)
    }

    /// Play the next track. `Ok(None)` at the last track.
    pub async fn next(&mut self) -> Result<Option<SessionId>, PlaybackError> {
        let index = self.current_index + 1;
        if index >= self.tracks.len() {
            return Ok(None);
        }
        self.play(index).await.map(Some)
    }

    /// Play the previous track. `Ok(None)` at the first track.
    pub async fn prev(&mut self) -> Result<Option<SessionId>, PlaybackError> {
        if self.current_index == 0 || self.tracks.is_empty() {
            return Ok(None);
        }
        self.play(self.current_index - 1).await.map(Some)
    }

    /// Seek within the current track.
    ///
    /// Returns `Ok(None)` when there is no seekable session.
    pub fn seek(&mut self, position: f64) -> Result<Option<f64>, PlaybackError> {
        if !self.session.has_resource() || !self.session.state().is_seekable() {
            return Ok(None);
        }
        self.session.seek(position).map(Some)
    }

    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        self.session.pause()
    }

    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        self.session.resume()
    }

    /// Stop playback and release the resource.
    pub fn stop(&mut self) {
        self.session.teardown();
        self.playing_reciter = None;
    }

    /// Apply a media event and perform any auto-advance it triggers.
    pub async fn handle_event(&mut self, event: MediaEvent) -> PlaylistStep {
        match self.session.handle_event(event) {
            None => PlaylistStep::Continue,
            Some(SessionOutcome::Failed { session, error }) => {
                warn!(session = %session, index = self.current_index, "Track failed, not advancing");
                PlaylistStep::Halted(error)
            }
            Some(SessionOutcome::Ended(_)) => self.advance().await,
        }
    }

    /// Wait for the next media event and apply it.
    ///
    /// Returns `None` only if the event queue closed.
    pub async fn process_next_event(&mut self) -> Option<PlaylistStep> {
        let event = self.session.recv_event().await?;
        Some(self.handle_event(event).await)
    }

    /// Apply events until one produces a playlist-level step.
    pub async fn run_until_idle_step(&mut self) -> Option<PlaylistStep> {
        loop {
            match self.process_next_event().await? {
                PlaylistStep::Continue => {}
                step => return Some(step),
            }
        }
    }

    /// Apply every queued event without waiting.
    pub async fn drain(&mut self) -> Vec<PlaylistStep> {
        let mut steps = Vec::new();
        while let Some(event) = self.session.try_recv_event() {
            match self.handle_event(event).await {
                PlaylistStep::Continue => {}
                step => steps.push(step),
            }
        }
        steps
    }

    async fn advance(&mut self) -> PlaylistStep {
        let index = self.current_index + 1;
        if index >= self.tracks.len() {
            let reciter = self
                .playing_reciter
                .clone()
                .unwrap_or_else(|| self.reciter.clone());
            info!(%reciter, tracks = self.tracks.len(), "Playlist complete");
            self.emitter
                .emit(PlaybackEvent::PlaylistComplete { reciter });
            return PlaylistStep::Completed;
        }

        match self.play(index).await {
            Ok(session) => {
                debug!(index, session = %session, "Playlist advanced");
                self.emitter.emit(PlaybackEvent::PlaylistAdvance { index });
                PlaylistStep::Advanced { index, session }
            }
            Err(error) => PlaylistStep::AdvanceFailed { index, error },
        }
    }

    fn check_bounds(&self, index: usize) -> Result<(), PlaybackError> {
        if self.tracks.is_empty() {
            return Err(PlaybackError::EmptyPlaylist);
        }
        if index >= self.tracks.len() {
            return Err(PlaybackError::TrackOutOfBounds {
                index,
                len: self.tracks.len(),
            });
        }
        Ok(())
    }
}

impl std::fmt::Debug for PlaylistController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaylistController")
            .field("reciter", &self.reciter)
            .field("tracks", &self.tracks.len())
            .field("current_index", &self.current_index)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}
