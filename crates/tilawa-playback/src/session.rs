//! Audio session controller - lifecycle of one media resource at a time.
//!
//! The controller is a state machine driven by two inputs: user operations
//! (`start`, `pause`, `resume`, `seek`, `teardown`) and [`MediaEvent`]s that
//! the platform queues through a session-scoped [`MediaListener`]:
//!
//! ```text
//!   Idle → Loading → Playing → {Paused, Ended, Error} → Idle (teardown)
//!            │          ▲
//!            └─ Paused ─┘   (paused before ready; resume waits for Ready)
//! ```
//!
//! Every event carries the session id it was emitted for. Only events for
//! the current session are applied; anything else is a stale callback and
//! is dropped with a debug log. Teardown detaches the listener before the
//! resource is released, so a torn-down resource cannot queue anything new.

use std::fmt;
use std::sync::Arc;

use tilawa_core::{
    ListenerGuard, MediaBackend, MediaEvent, MediaListener, MediaResource, MediaSignal,
    PlaybackError, PlaybackEvent, PlaybackEventEmitter, SessionId, SessionSequence, SessionState,
    SourceKey,
};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::registry::{Autoplay, PlaybackHandle, PlaybackRegistry};

/// What a processed media event meant for the session as a whole.
#[derive(Debug, Clone)]
pub enum SessionOutcome {
    /// The session played through to its natural end.
    Ended(SessionId),
    /// The session failed; it stays in `Error` until restarted.
    Failed {
        session: SessionId,
        error: PlaybackError,
    },
}

/// Hook invoked when a session ends naturally.
pub type CompletionHook = Box<dyn FnMut(SessionId) + Send + 'static>;

struct ActiveSession {
    handle: PlaybackHandle,
    resource: Arc<dyn MediaResource>,
    guard: ListenerGuard,
    ready: bool,
    position: f64,
    duration: Option<f64>,
}

/// Owns at most one media resource and drives it through its lifecycle.
pub struct AudioSessionController {
    registry: PlaybackRegistry,
    backend: Arc<dyn MediaBackend>,
    emitter: Arc<dyn PlaybackEventEmitter>,
    sequence: SessionSequence,
    state: SessionState,
    /// Most recently allocated session, kept after teardown for event tagging.
    current: Option<SessionId>,
    active: Option<ActiveSession>,
    on_complete: Option<CompletionHook>,
    events_tx: mpsc::UnboundedSender<MediaEvent>,
    events_rx: mpsc::UnboundedReceiver<MediaEvent>,
}

impl AudioSessionController {
    pub fn new(
        registry: PlaybackRegistry,
        backend: Arc<dyn MediaBackend>,
        emitter: Arc<dyn PlaybackEventEmitter>,
    ) -> Self {
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            registry,
            backend,
            emitter,
            sequence: SessionSequence::new(),
            state: SessionState::Idle,
            current: None,
            active: None,
            on_complete: None,
            events_tx,
            events_rx,
        }
    }

    #[must_use]
    pub const fn state(&self) -> SessionState {
        self.state
    }

    /// The most recently started session, even if it has been torn down.
    #[must_use]
    pub const fn current_session(&self) -> Option<SessionId> {
        self.current
    }

    /// Handle of the session that currently owns a resource.
    #[must_use]
    pub fn handle(&self) -> Option<&PlaybackHandle> {
        self.active.as_ref().map(|a| &a.handle)
    }

    /// Whether a resource is attached.
    #[must_use]
    pub const fn has_resource(&self) -> bool {
        self.active.is_some()
    }

    /// Last reported position in seconds.
    #[must_use]
    pub fn position(&self) -> Option<f64> {
        self.active.as_ref().map(|a| a.position)
    }

    /// Duration in seconds, once the resource reported it.
    #[must_use]
    pub fn duration(&self) -> Option<f64> {
        self.active.as_ref().and_then(|a| a.duration)
    }

    /// Install a hook called with the session id on every natural end.
    pub fn on_complete(&mut self, hook: CompletionHook) {
        self.on_complete = Some(hook);
    }

    // ── Operations ─────────────────────────────────────────────────

    /// Start a new session for `source` at `url`.
    ///
    /// Any prior session is torn down first. The new session enters
    /// `Loading` and becomes `Playing` only when its own `Ready` arrives.
    pub fn start(
        &mut self,
        source: SourceKey,
        url: impl Into<String>,
    ) -> Result<SessionId, PlaybackError> {
        self.teardown();

        let url = url.into();
        let session = self.sequence.next_id();
        self.current = Some(session);
        debug!(session = %session, %source, %url, "Starting audio session");
        self.set_state(session, SessionState::Loading);

        let (listener, guard) = MediaListener::attach(session, self.events_tx.clone());
        let resource = match self.backend.open(&url, listener.clone()) {
            Ok(resource) => resource,
            Err(failure) => {
                guard.detach();
                let error = PlaybackError::from(failure);
                warn!(session = %session, error = %error, "Failed to open media resource");
                self.set_state(session, SessionState::Error);
                self.emitter
                    .emit(PlaybackEvent::session_error(Some(session), error.to_string()));
                return Err(error);
            }
        };

        let stopper = {
            let resource = Arc::clone(&resource);
            move || {
                if listener.is_attached() {
                    resource.pause();
                    listener.emit(MediaSignal::Interrupted);
                }
            }
        };
        let handle = PlaybackHandle::new(session, source, url, stopper);
        self.registry.claim(&handle);

        self.active = Some(ActiveSession {
            handle,
            resource,
            guard,
            ready: false,
            position: 0.0,
            duration: None,
        });
        Ok(session)
    }

    /// Pause the current session.
    ///
    /// Pausing while `Loading` keeps the resource but prevents the pending
    /// `Ready` from starting playback.
    pub fn pause(&mut self) -> Result<(), PlaybackError> {
        let Some((session, handle, resource)) = self.active_parts() else {
            return Err(PlaybackError::NoActiveSession);
        };
        match self.state {
            SessionState::Playing => {
                resource.pause();
                self.registry.clear(&handle);
                self.set_state(session, SessionState::Paused);
                Ok(())
            }
            SessionState::Loading => {
                self.set_state(session, SessionState::Paused);
                Ok(())
            }
            SessionState::Paused => Ok(()),
            state => Err(PlaybackError::InvalidState {
                operation: "pause",
                state,
            }),
        }
    }

    /// Resume a paused session.
    pub fn resume(&mut self) -> Result<(), PlaybackError> {
        let Some((session, handle, resource)) = self.active_parts() else {
            return Err(PlaybackError::NoActiveSession);
        };
        match self.state {
            SessionState::Paused if self.active.as_ref().is_some_and(|a| a.ready) => {
                self.registry.register(&handle);
                resource.play();
                self.set_state(session, SessionState::Playing);
                Ok(())
            }
            SessionState::Paused => {
                // Not buffered yet: go back to waiting for Ready.
                self.set_state(session, SessionState::Loading);
                Ok(())
            }
            SessionState::Playing | SessionState::Loading => Ok(()),
            state => Err(PlaybackError::InvalidState {
                operation: "resume",
                state,
            }),
        }
    }

    /// Seek to `position` seconds, clamped to `[0, duration]`.
    ///
    /// Returns the position actually applied.
    pub fn seek(&mut self, position: f64) -> Result<f64, PlaybackError> {
        let state = self.state;
        let Some(active) = self.active.as_mut() else {
            return Err(PlaybackError::NoActiveSession);
        };
        if !state.is_seekable() {
            return Err(PlaybackError::InvalidState {
                operation: "seek",
                state,
            });
        }

        let upper = active.duration.unwrap_or(f64::INFINITY);
        let target = if position.is_nan() {
            0.0
        } else {
            position.max(0.0).min(upper)
        };
        active.resource.seek(target);
        active.position = target;

        let session = active.handle.session();
        let duration = active.duration;
        self.emitter
            .emit(PlaybackEvent::progress(session, target, duration));
        Ok(target)
    }

    /// Detach listeners, release the resource and return to `Idle`.
    ///
    /// Idempotent.
    pub fn teardown(&mut self) {
        if let Some(active) = self.active.take() {
            let session = active.handle.session();
            active.guard.detach();
            active.resource.pause();
            active.resource.release();
            self.registry.clear(&active.handle);
            active.handle.set_state(SessionState::Idle);
            debug!(session = %session, "Audio session torn down");
            self.set_state(session, SessionState::Idle);
        } else if let Some(session) = self.current {
            self.set_state(session, SessionState::Idle);
        }
    }

    // ── Event processing ───────────────────────────────────────────

    /// Apply one media event.
    ///
    /// Returns an outcome when the event ended or failed the session.
    pub fn handle_event(&mut self, event: MediaEvent) -> Option<SessionOutcome> {
        let Some((session, handle, resource)) = self
            .active_parts()
            .filter(|(session, _, _)| *session == event.session)
        else {
            debug!(
                stale = %event.session,
                current = ?self.current.map(|s| s.to_string()),
                signal = ?event.signal,
                "Dropping stale media callback"
            );
            return None;
        };

        match event.signal {
            MediaSignal::Ready { duration } => {
                if let Some(active) = self.active.as_mut() {
                    active.ready = true;
                    active.duration = duration;
                }
                match self.state {
                    SessionState::Loading => match self.registry.register_autoplay(&handle) {
                        Autoplay::Registered { .. } => {
                            resource.play();
                            self.set_state(session, SessionState::Playing);
                        }
                        Autoplay::Superseded => {
                            // A newer session owns playback; wait for resume().
                            self.set_state(session, SessionState::Paused);
                        }
                    },
                    state => {
                        debug!(session = %session, ?state, "Ready after user action, not autoplaying");
                    }
                }
                None
            }
            MediaSignal::Progress { position, duration } => {
                if self.state.is_seekable() {
                    if let Some(active) = self.active.as_mut() {
                        active.position = position;
                        if duration.is_some() {
                            active.duration = duration;
                        }
                    }
                    let duration = self.duration();
                    self.emitter
                        .emit(PlaybackEvent::progress(session, position, duration));
                }
                None
            }
            MediaSignal::Paused | MediaSignal::Interrupted => {
                if self.state == SessionState::Playing {
                    self.registry.clear(&handle);
                    self.set_state(session, SessionState::Paused);
                }
                None
            }
            MediaSignal::Ended => {
                if self.state != SessionState::Playing {
                    return None;
                }
                self.registry.clear(&handle);
                self.set_state(session, SessionState::Ended);
                if let Some(hook) = self.on_complete.as_mut() {
                    hook(session);
                }
                Some(SessionOutcome::Ended(session))
            }
            MediaSignal::Failed(failure) => {
                if self.state == SessionState::Error {
                    return None;
                }
                let error = PlaybackError::from(failure);
                warn!(session = %session, error = %error, "Audio session failed");
                resource.pause();
                self.registry.clear(&handle);
                self.set_state(session, SessionState::Error);
                self.emitter
                    .emit(PlaybackEvent::session_error(Some(session), error.to_string()));
                Some(SessionOutcome::Failed { session, error })
            }
        }
    }

    /// Take the next queued media event without waiting.
    pub fn try_recv_event(&mut self) -> Option<MediaEvent> {
        self.events_rx.try_recv().ok()
    }

    /// Wait for the next media event.
    ///
    /// The controller keeps a sender of its own queue, so this only returns
    /// `None` if the queue is closed from outside.
    pub async fn recv_event(&mut self) -> Option<MediaEvent> {
        self.events_rx.recv().await
    }

    /// Wait for one media event and apply it.
    pub async fn process_next_event(&mut self) -> Option<SessionOutcome> {
        let event = self.recv_event().await?;
        self.handle_event(event)
    }

    /// Apply events until one ends or fails the session.
    pub async fn next_outcome(&mut self) -> Option<SessionOutcome> {
        loop {
            let event = self.recv_event().await?;
            if let Some(outcome) = self.handle_event(event) {
                return Some(outcome);
            }
        }
    }

    /// Apply every event already queued, in order.
    pub fn drain(&mut self) -> Vec<SessionOutcome> {
        let mut outcomes = Vec::new();
        while let Some(event) = self.try_recv_event() {
            if let Some(outcome) = self.handle_event(event) {
                outcomes.push(outcome);
            }
        }
        outcomes
    }

    // ── Internal helpers ───────────────────────────────────────────

    fn active_parts(&self) -> Option<(SessionId, PlaybackHandle, Arc<dyn MediaResource>)> {
        self.active.as_ref().map(|a| {
            (
                a.handle.session(),
                a.handle.clone(),
                Arc::clone(&a.resource),
            )
        })
    }

    /// Transition to a new state and emit a state-change event.
    fn set_state(&mut self, session: SessionId, new_state: SessionState) {
        if self.state == new_state {
            return;
        }
        debug!(session = %session, old = ?self.state, new = ?new_state, "Session state transition");
        self.state = new_state;
        if let Some(active) = self.active.as_ref() {
            if active.handle.session() == session {
                active.handle.set_state(new_state);
            }
        }
        self.emitter
            .emit(PlaybackEvent::state_changed(session, new_state));
    }
}

impl fmt::Debug for AudioSessionController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AudioSessionController")
            .field("state", &self.state)
            .field("current", &self.current)
            .field("has_resource", &self.active.is_some())
            .finish_non_exhaustive()
    }
}

impl Drop for AudioSessionController {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tilawa_core::testing::{RecordingEmitter, ResourceCall, ScriptedMediaBackend};
    use tilawa_core::{MediaFailure, VerseKey};

    fn verse(surah: u16, ayah: u16) -> SourceKey {
        SourceKey::Verse(VerseKey::new(surah, ayah).unwrap())
    }

    fn controller(
        registry: &PlaybackRegistry,
    ) -> (AudioSessionController, ScriptedMediaBackend, RecordingEmitter) {
        let backend = ScriptedMediaBackend::new();
        let emitter = RecordingEmitter::new();
        let ctrl = AudioSessionController::new(
            registry.clone(),
            Arc::new(backend.clone()),
            Arc::new(emitter.clone()),
        );
        (ctrl, backend, emitter)
    }

    #[test]
    fn start_enters_loading_and_ready_plays() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, emitter) = controller(&registry);

        let session = ctrl.start(verse(1, 1), "https://a/1").unwrap();
        assert_eq!(ctrl.state(), SessionState::Loading);
        assert!(registry.query().is_none(), "not registered until ready");

        backend.last().unwrap().ready(12.0);
        ctrl.drain();

        assert_eq!(ctrl.state(), SessionState::Playing);
        assert!(registry.is_active(session));
        assert_eq!(ctrl.duration(), Some(12.0));
        assert_eq!(
            emitter.states_for(session),
            vec![SessionState::Loading, SessionState::Playing]
        );
        assert_eq!(
            backend.last().unwrap().resource.count(&ResourceCall::Play),
            1
        );
    }

    #[test]
    fn ready_after_pause_does_not_autoplay() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        ctrl.pause().unwrap();
        backend.last().unwrap().ready(5.0);
        ctrl.drain();

        assert_eq!(ctrl.state(), SessionState::Paused);
        assert!(registry.query().is_none());
        assert_eq!(backend.last().unwrap().resource.count(&ResourceCall::Play), 0);

        ctrl.resume().unwrap();
        assert_eq!(ctrl.state(), SessionState::Playing);
        assert!(registry.query().is_some());
    }

    #[test]
    fn resume_before_ready_waits_for_ready() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        ctrl.pause().unwrap();
        ctrl.resume().unwrap();
        assert_eq!(ctrl.state(), SessionState::Loading);

        backend.last().unwrap().ready(5.0);
        ctrl.drain();
        assert_eq!(ctrl.state(), SessionState::Playing);
    }

    #[test]
    fn pause_clears_registry() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        backend.last().unwrap().ready(5.0);
        ctrl.drain();

        ctrl.pause().unwrap();
        assert_eq!(ctrl.state(), SessionState::Paused);
        assert!(registry.query().is_none());
        assert_eq!(backend.last().unwrap().resource.count(&ResourceCall::Pause), 1);
    }

    #[test]
    fn external_pause_signal_moves_to_paused() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        let media = backend.last().unwrap();
        media.ready(5.0);
        media.pause_externally();
        ctrl.drain();

        assert_eq!(ctrl.state(), SessionState::Paused);
        assert!(registry.query().is_none());
    }

    #[test]
    fn natural_end_reports_outcome_and_hook() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);
        let completions = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&completions);
        ctrl.on_complete(Box::new(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        }));

        let session = ctrl.start(verse(1, 1), "https://a/1").unwrap();
        let media = backend.last().unwrap();
        media.ready(5.0);
        media.end();
        media.end();
        let outcomes = ctrl.drain();

        assert_eq!(outcomes.len(), 1);
        assert!(matches!(outcomes[0], SessionOutcome::Ended(s) if s == session));
        assert_eq!(ctrl.state(), SessionState::Ended);
        assert!(registry.query().is_none());
        assert_eq!(completions.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failure_moves_to_error_without_retry() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, emitter) = controller(&registry);

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        let media = backend.last().unwrap();
        media.ready(5.0);
        media.fail(MediaFailure::Decode("corrupt frame".into()));
        let outcomes = ctrl.drain();

        assert!(matches!(
            outcomes.as_slice(),
            [SessionOutcome::Failed {
                error: PlaybackError::MediaDecode(_),
                ..
            }]
        ));
        assert_eq!(ctrl.state(), SessionState::Error);
        assert!(registry.query().is_none());
        assert_eq!(backend.open_count(), 1, "no automatic retry");
        assert!(
            emitter
                .events()
                .iter()
                .any(|e| matches!(e, PlaybackEvent::SessionError { .. }))
        );
    }

    #[test]
    fn open_failure_is_transport_error() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);
        backend.fail_next_open(MediaFailure::Transport("dns".into()));

        let err = ctrl.start(verse(1, 1), "https://a/1").unwrap_err();
        assert!(matches!(err, PlaybackError::Transport(_)));
        assert_eq!(ctrl.state(), SessionState::Error);
        assert!(!ctrl.has_resource());
        assert!(registry.query().is_none());

        ctrl.teardown();
        assert_eq!(ctrl.state(), SessionState::Idle);
    }

    #[test]
    fn restart_detaches_previous_listener() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        let first = backend.last().unwrap();
        let second_session = ctrl.start(verse(1, 2), "https://a/2").unwrap();

        assert!(!first.listener.is_attached());
        assert!(!first.ready(5.0), "detached listener cannot queue");
        assert!(first.resource.is_released());

        backend.last().unwrap().ready(5.0);
        ctrl.drain();
        assert!(registry.is_active(second_session));
    }

    #[test]
    fn stale_event_is_dropped() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        let first = backend.last().unwrap();
        ctrl.start(verse(1, 2), "https://a/2").unwrap();

        // Forge an event for the first session as if it had been queued late.
        let outcome = ctrl.handle_event(MediaEvent {
            session: first.session(),
            signal: MediaSignal::Ready { duration: None },
        });

        assert!(outcome.is_none());
        assert_eq!(ctrl.state(), SessionState::Loading);
        assert!(registry.query().is_none());
    }

    #[test]
    fn seek_clamps_to_duration() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, _emitter) = controller(&registry);

        assert!(matches!(ctrl.seek(1.0), Err(PlaybackError::NoActiveSession)));

        ctrl.start(verse(1, 1), "https://a/1").unwrap();
        assert!(matches!(
            ctrl.seek(1.0),
            Err(PlaybackError::InvalidState { operation: "seek", .. })
        ));

        backend.last().unwrap().ready(30.0);
        ctrl.drain();

        assert!((ctrl.seek(-4.0).unwrap() - 0.0).abs() < f64::EPSILON);
        assert!((ctrl.seek(99.0).unwrap() - 30.0).abs() < f64::EPSILON);
        assert!((ctrl.seek(f64::NAN).unwrap() - 0.0).abs() < f64::EPSILON);
        assert!((ctrl.seek(12.5).unwrap() - 12.5).abs() < f64::EPSILON);
        assert_eq!(
            backend.last().unwrap().resource.calls().last(),
            Some(&ResourceCall::Seek(12.5))
        );
    }

    #[test]
    fn teardown_is_idempotent() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, emitter) = controller(&registry);

        let session = ctrl.start(verse(1, 1), "https://a/1").unwrap();
        backend.last().unwrap().ready(5.0);
        ctrl.drain();

        ctrl.teardown();
        ctrl.teardown();

        assert_eq!(ctrl.state(), SessionState::Idle);
        assert!(registry.query().is_none());
        assert_eq!(
            backend.last().unwrap().resource.count(&ResourceCall::Release),
            1
        );
        assert_eq!(
            emitter.states_for(session),
            vec![
                SessionState::Loading,
                SessionState::Playing,
                SessionState::Idle
            ]
        );
    }

    #[test]
    fn progress_updates_position() {
        let registry = PlaybackRegistry::new();
        let (mut ctrl, backend, emitter) = controller(&registry);

        let session = ctrl.start(verse(1, 1), "https://a/1").unwrap();
        let media = backend.last().unwrap();
        media.progress(1.0, 10.0); // ignored while loading
        media.ready(10.0);
        media.progress(3.0, 10.0);
        ctrl.drain();

        assert_eq!(ctrl.position(), Some(3.0));
        let progress: Vec<_> = emitter
            .events()
            .into_iter()
            .filter(|e| matches!(e, PlaybackEvent::Progress { .. }))
            .collect();
        assert_eq!(
            progress,
            vec![PlaybackEvent::progress(session, 3.0, Some(10.0))]
        );
    }
}
