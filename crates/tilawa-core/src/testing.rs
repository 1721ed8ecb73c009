//! Scripted fakes for the media, content and event ports.
//!
//! Available under `cfg(test)` and the `test-utils` feature. The fakes never
//! fire on their own: tests drive every media signal explicitly, which keeps
//! interleavings deterministic.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use async_trait::async_trait;

use crate::domain::{ReciterId, SessionId, SessionState, Track, TrackId};
use crate::events::PlaybackEvent;
use crate::ports::{
    ContentError, ContentProvider, MediaBackend, MediaFailure, MediaListener, MediaResource,
    MediaSignal, PlaybackEventEmitter,
};

// ── Media ──────────────────────────────────────────────────────────

/// A call made on a [`ScriptedResource`].
#[derive(Debug, Clone, PartialEq)]
pub enum ResourceCall {
    Play,
    Pause,
    Seek(f64),
    Release,
}

/// Media resource that records every call made on it.
#[derive(Debug, Default)]
pub struct ScriptedResource {
    calls: Mutex<Vec<ResourceCall>>,
}

impl ScriptedResource {
    fn record(&self, call: ResourceCall) {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(call);
    }

    /// All calls so far, in order.
    pub fn calls(&self) -> Vec<ResourceCall> {
        self.calls
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of times `call` was made.
    pub fn count(&self, call: &ResourceCall) -> usize {
        self.calls().iter().filter(|c| *c == call).count()
    }

    pub fn is_released(&self) -> bool {
        self.count(&ResourceCall::Release) > 0
    }
}

impl MediaResource for ScriptedResource {
    fn play(&self) {
        self.record(ResourceCall::Play);
    }

    fn pause(&self) {
        self.record(ResourceCall::Pause);
    }

    fn seek(&self, position: f64) {
        self.record(ResourceCall::Seek(position));
    }

    fn release(&self) {
        self.record(ResourceCall::Release);
    }
}

/// One resource opened through a [`ScriptedMediaBackend`].
///
/// Holds the listener the controller attached, so tests can play the part
/// of the platform and fire signals at any time, including after teardown.
#[derive(Debug, Clone)]
pub struct OpenedMedia {
    pub url: String,
    pub listener: MediaListener,
    pub resource: Arc<ScriptedResource>,
}

impl OpenedMedia {
    pub fn session(&self) -> SessionId {
        self.listener.session()
    }

    /// Fire `Ready` with a known duration.
    pub fn ready(&self, duration: f64) -> bool {
        self.listener.emit(MediaSignal::Ready {
            duration: Some(duration),
        })
    }

    pub fn progress(&self, position: f64, duration: f64) -> bool {
        self.listener.emit(MediaSignal::Progress {
            position,
            duration: Some(duration),
        })
    }

    /// Fire a platform-originated pause.
    pub fn pause_externally(&self) -> bool {
        self.listener.emit(MediaSignal::Paused)
    }

    pub fn end(&self) -> bool {
        self.listener.emit(MediaSignal::Ended)
    }

    pub fn fail(&self, failure: MediaFailure) -> bool {
        self.listener.emit(MediaSignal::Failed(failure))
    }
}

#[derive(Debug, Default)]
struct ScriptedBackendState {
    opened: Vec<OpenedMedia>,
    fail_next_open: Option<MediaFailure>,
}

/// Media backend whose resources only do what the test tells them to.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMediaBackend {
    state: Arc<Mutex<ScriptedBackendState>>,
}

impl ScriptedMediaBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `open` call fail with `failure`.
    pub fn fail_next_open(&self, failure: MediaFailure) {
        self.lock().fail_next_open = Some(failure);
    }

    /// Every resource opened so far, oldest first.
    pub fn opened(&self) -> Vec<OpenedMedia> {
        self.lock().opened.clone()
    }

    /// The most recently opened resource.
    pub fn last(&self) -> Option<OpenedMedia> {
        self.lock().opened.last().cloned()
    }

    pub fn open_count(&self) -> usize {
        self.lock().opened.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ScriptedBackendState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl MediaBackend for ScriptedMediaBackend {
    fn open(
        &self,
        url: &str,
        listener: MediaListener,
    ) -> Result<Arc<dyn MediaResource>, MediaFailure> {
        let mut state = self.lock();
        if let Some(failure) = state.fail_next_open.take() {
            return Err(failure);
        }
        let resource = Arc::new(ScriptedResource::default());
        state.opened.push(OpenedMedia {
            url: url.to_string(),
            listener,
            resource: Arc::clone(&resource),
        });
        Ok(resource)
    }
}

// ── Content ────────────────────────────────────────────────────────

/// In-memory content provider.
///
/// Track URLs have the form `https://audio.test/{reciter}/{track:03}.mp3`.
#[derive(Debug, Default)]
pub struct StaticContentProvider {
    tracks: HashMap<ReciterId, Vec<Track>>,
    unresolvable: Vec<TrackId>,
    url_lookups: AtomicUsize,
}

impl StaticContentProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a reciter with tracks `ids`.
    #[must_use]
    pub fn with_reciter(mut self, reciter: &str, ids: &[u32]) -> Self {
        let tracks = ids.iter().map(|id| Track::new(TrackId(*id))).collect();
        self.tracks.insert(ReciterId::from(reciter), tracks);
        self
    }

    /// Make URL resolution for `track` fail as if the provider were offline.
    #[must_use]
    pub fn with_unresolvable(mut self, track: u32) -> Self {
        self.unresolvable.push(TrackId(track));
        self
    }

    /// URL that [`ContentProvider::track_audio_url`] returns.
    pub fn url_for(reciter: &ReciterId, track: TrackId) -> String {
        format!("https://audio.test/{reciter}/{:03}.mp3", track.0)
    }

    pub fn url_lookups(&self) -> usize {
        self.url_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContentProvider for StaticContentProvider {
    async fn list_tracks(&self, reciter: &ReciterId) -> Result<Vec<Track>, ContentError> {
        self.tracks
            .get(reciter)
            .cloned()
            .ok_or_else(|| ContentError::NotFound(format!("reciter {reciter}")))
    }

    async fn track_audio_url(
        &self,
        reciter: &ReciterId,
        track: TrackId,
    ) -> Result<String, ContentError> {
        self.url_lookups.fetch_add(1, Ordering::SeqCst);
        if self.unresolvable.contains(&track) {
            return Err(ContentError::Unavailable("connection reset".to_string()));
        }
        Ok(Self::url_for(reciter, track))
    }
}

// ── Events ─────────────────────────────────────────────────────────

/// Emitter that keeps every event for later inspection.
#[derive(Debug, Clone, Default)]
pub struct RecordingEmitter {
    events: Arc<Mutex<Vec<PlaybackEvent>>>,
}

impl RecordingEmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<PlaybackEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Remove and return everything recorded so far.
    pub fn take(&self) -> Vec<PlaybackEvent> {
        std::mem::take(&mut *self.events.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// State transitions reported for `session`, in order.
    pub fn states_for(&self, session: SessionId) -> Vec<SessionState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::StateChanged { session: s, state } if s == session => Some(state),
                _ => None,
            })
            .collect()
    }

    /// Every state transition, regardless of session.
    pub fn all_states(&self) -> Vec<SessionState> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                PlaybackEvent::StateChanged { state, .. } => Some(state),
                _ => None,
            })
            .collect()
    }
}

impl PlaybackEventEmitter for RecordingEmitter {
    fn emit(&self, event: PlaybackEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }

    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter> {
        Box::new(self.clone())
    }
}
