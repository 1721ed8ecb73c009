//! Single-flight speech synthesis.
//!
//! Each [`SpeechSynthesisController`] runs at most one synthesis session at a
//! time: a new [`request`](SpeechSynthesisController::request) cancels the
//! previous one first. Synthesis is a separate mutual-exclusion domain from
//! recitation, so it never touches the playback registry.

use std::fmt;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tilawa_core::{
    ControllerId, PlaybackEvent, PlaybackEventEmitter, SpeechAudio, SynthesisProvider,
    SynthesisState,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::SynthesisError;
use crate::health::HealthMonitor;

type CompletionCallback = Box<dyn FnOnce(SynthesisState) + Send + 'static>;

struct ControlInner {
    controller: ControllerId,
    request: u64,
    state: Mutex<SynthesisState>,
    token: CancellationToken,
    superseded: AtomicBool,
    on_complete: Mutex<Option<CompletionCallback>>,
    emitter: Arc<dyn PlaybackEventEmitter>,
}

/// Control object for one synthesis session.
///
/// Clones refer to the same session. The completion callback fires at most
/// once, with the terminal state the session reached.
#[derive(Clone)]
pub struct SynthesisControl {
    inner: Arc<ControlInner>,
}

impl SynthesisControl {
    fn new(controller: ControllerId, request: u64, emitter: Arc<dyn PlaybackEventEmitter>) -> Self {
        Self {
            inner: Arc::new(ControlInner {
                controller,
                request,
                state: Mutex::new(SynthesisState::Requesting),
                token: CancellationToken::new(),
                superseded: AtomicBool::new(false),
                on_complete: Mutex::new(None),
                emitter,
            }),
        }
    }

    #[must_use]
    pub fn request_id(&self) -> u64 {
        self.inner.request
    }

    #[must_use]
    pub fn controller(&self) -> ControllerId {
        self.inner.controller
    }

    #[must_use]
    pub fn state(&self) -> SynthesisState {
        *self.lock_state()
    }

    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.inner.token.is_cancelled()
    }

    /// Cancel the session.
    ///
    /// Returns `false` when the session had already reached a terminal
    /// state, in which case nothing happens.
    pub fn cancel(&self) -> bool {
        if !self.transition(SynthesisState::Cancelled) {
            return false;
        }
        self.inner.token.cancel();
        true
    }

    /// Report that playback of the synthesized audio finished naturally.
    ///
    /// Only valid from `Ready`; returns whether the session completed.
    pub fn complete(&self) -> bool {
        if self.state() != SynthesisState::Ready {
            return false;
        }
        self.transition(SynthesisState::Completed)
    }

    /// Register a callback for the session's terminal state.
    ///
    /// If the session already finished, the callback runs immediately.
    pub fn on_complete(&self, callback: impl FnOnce(SynthesisState) + Send + 'static) {
        let state = self.state();
        if state.is_terminal() {
            callback(state);
            return;
        }
        *self
            .inner
            .on_complete
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(Box::new(callback));
    }

    /// Resolves once the session is cancelled.
    pub fn cancelled(&self) -> impl Future<Output = ()> + Send + '_ {
        self.inner.token.cancelled()
    }

    fn supersede(&self) {
        self.inner.superseded.store(true, Ordering::SeqCst);
        self.cancel();
    }

    fn was_superseded(&self) -> bool {
        self.inner.superseded.load(Ordering::SeqCst)
    }

    /// Move to `next` unless already terminal. Fires the completion
    /// callback on entering a terminal state.
    fn transition(&self, next: SynthesisState) -> bool {
        {
            let mut state = self.lock_state();
            if state.is_terminal() || *state == next {
                return false;
            }
            *state = next;
        }

        debug!(
            controller = %self.inner.controller,
            request = self.inner.request,
            state = ?next,
            "Synthesis state transition"
        );
        self.inner.emitter.emit(PlaybackEvent::SynthesisStateChanged {
            controller: self.inner.controller,
            request: self.inner.request,
            state: next,
        });

        if next.is_terminal() {
            let callback = self
                .inner
                .on_complete
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
            if let Some(callback) = callback {
                callback(next);
            }
        }
        true
    }

    fn lock_state(&self) -> MutexGuard<'_, SynthesisState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl PartialEq for SynthesisControl {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for SynthesisControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SynthesisControl")
            .field("controller", &self.inner.controller)
            .field("request", &self.inner.request)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// A successful synthesis: playable audio plus its control object.
#[derive(Debug, Clone)]
pub struct SynthesisSession {
    pub text: String,
    pub language: String,
    pub audio: SpeechAudio,
    pub control: SynthesisControl,
}

#[derive(Default)]
struct ControllerState {
    last_request: u64,
    active: Option<SynthesisControl>,
}

/// Requests speech from a [`SynthesisProvider`], one session at a time.
pub struct SpeechSynthesisController {
    id: ControllerId,
    provider: Arc<dyn SynthesisProvider>,
    health: HealthMonitor,
    emitter: Arc<dyn PlaybackEventEmitter>,
    timeout: Option<Duration>,
    state: Mutex<ControllerState>,
}

impl SpeechSynthesisController {
    pub fn new(
        provider: Arc<dyn SynthesisProvider>,
        health: HealthMonitor,
        emitter: Arc<dyn PlaybackEventEmitter>,
    ) -> Self {
        Self {
            id: ControllerId::new(),
            provider,
            health,
            emitter,
            timeout: None,
            state: Mutex::new(ControllerState::default()),
        }
    }

    /// Bound every provider call by `timeout`.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    #[must_use]
    pub const fn id(&self) -> ControllerId {
        self.id
    }

    #[must_use]
    pub const fn health(&self) -> &HealthMonitor {
        &self.health
    }

    /// The session that is still in flight or playing, if any.
    #[must_use]
    pub fn current(&self) -> Option<SynthesisControl> {
        self.lock()
            .active
            .clone()
            .filter(|c| !c.state().is_terminal())
    }

    /// Cancel whatever session is active. Returns whether one was.
    pub fn cancel(&self) -> bool {
        let active = self.lock().active.take();
        active.is_some_and(|c| c.cancel())
    }

    /// Synthesize `text` in `language`.
    ///
    /// Cancels any previous session on this controller first, including
    /// when `text` is blank. Fails fast with
    /// [`SynthesisError::ServiceUnavailable`] while the provider is
    /// unhealthy, without calling it.
    pub async fn request(
        &self,
        text: &str,
        language: &str,
    ) -> Result<SynthesisSession, SynthesisError> {
        if text.trim().is_empty() {
            let previous = self.lock().active.take();
            if let Some(previous) = previous {
                debug!(
                    controller = %self.id,
                    request = previous.request_id(),
                    "Blank request superseding previous synthesis request"
                );
                previous.supersede();
            }
            return Err(SynthesisError::EmptyText);
        }

        let (control, previous) = {
            let mut state = self.lock();
            state.last_request += 1;
            let control =
                SynthesisControl::new(self.id, state.last_request, Arc::clone(&self.emitter));
            let previous = state.active.replace(control.clone());
            (control, previous)
        };
        if let Some(previous) = previous {
            debug!(
                controller = %self.id,
                request = previous.request_id(),
                "Superseding previous synthesis request"
            );
            previous.supersede();
        }
        self.emitter.emit(PlaybackEvent::SynthesisStateChanged {
            controller: self.id,
            request: control.request_id(),
            state: SynthesisState::Requesting,
        });

        if !self.health.is_healthy() {
            debug!(controller = %self.id, "Synthesis provider unhealthy, failing fast");
            self.fail(&control);
            return Err(SynthesisError::ServiceUnavailable);
        }

        let outcome = tokio::select! {
            biased;
            () = control.cancelled() => None,
            result = self.call_provider(text, language) => Some(result),
        };

        match outcome {
            None => Err(Self::cancellation_reason(&control)),
            Some(Err(error)) => {
                if control.is_cancelled() {
                    return Err(Self::cancellation_reason(&control));
                }
                warn!(controller = %self.id, error = %error, "Speech synthesis failed");
                self.fail(&control);
                self.health.mark_unhealthy();
                Err(error)
            }
            Some(Ok(audio)) => {
                if !control.transition(SynthesisState::Ready) {
                    return Err(Self::cancellation_reason(&control));
                }
                debug!(
                    controller = %self.id,
                    request = control.request_id(),
                    bytes = audio.len(),
                    "Speech synthesized"
                );
                Ok(SynthesisSession {
                    text: text.to_string(),
                    language: language.to_string(),
                    audio,
                    control,
                })
            }
        }
    }

    async fn call_provider(&self, text: &str, language: &str) -> Result<SpeechAudio, SynthesisError> {
        let call = self.provider.synthesize(text, language);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, call)
                .await
                .map_err(|_| SynthesisError::Timeout(limit))?,
            None => call.await,
        };
        let audio = result?;
        if audio.is_empty() {
            return Err(SynthesisError::Service(
                "provider returned no audio".to_string(),
            ));
        }
        Ok(audio)
    }

    /// Mark `control` failed and unregister it if it is still the active one.
    fn fail(&self, control: &SynthesisControl) {
        control.transition(SynthesisState::Failed);
        let mut state = self.lock();
        if state.active.as_ref() == Some(control) {
            state.active = None;
        }
    }

    fn cancellation_reason(control: &SynthesisControl) -> SynthesisError {
        if control.was_superseded() {
            SynthesisError::Superseded
        } else {
            SynthesisError::Cancelled
        }
    }

    fn lock(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for SpeechSynthesisController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechSynthesisController")
            .field("id", &self.id)
            .field("timeout", &self.timeout)
            .field("current", &self.current())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use mockall::mock;
    use std::sync::atomic::AtomicUsize;
    use tilawa_core::testing::RecordingEmitter;
    use tilawa_core::{HealthProbe, ProbeError, SynthesisProviderError};

    mock! {
        pub Provider {}

        #[async_trait]
        impl SynthesisProvider for Provider {
            async fn synthesize(
                &self,
                text: &str,
                language: &str,
            ) -> Result<SpeechAudio, SynthesisProviderError>;
        }
    }

    mock! {
        pub Probe {}

        #[async_trait]
        impl HealthProbe for Probe {
            async fn check(&self) -> Result<(), ProbeError>;
        }
    }

    /// Provider that never answers, for cancellation tests.
    struct HangingProvider;

    #[async_trait]
    impl SynthesisProvider for HangingProvider {
        async fn synthesize(
            &self,
            _text: &str,
            _language: &str,
        ) -> Result<SpeechAudio, SynthesisProviderError> {
            std::future::pending().await
        }
    }

    fn audio() -> SpeechAudio {
        SpeechAudio::new(vec![0xFF, 0xF3, 0x44, 0xC4], "audio/mpeg")
    }

    fn health(emitter: &RecordingEmitter) -> HealthMonitor {
        let mut probe = MockProbe::new();
        probe.expect_check().returning(|| Ok(()));
        HealthMonitor::new(
            Arc::new(probe),
            Duration::from_secs(60),
            Duration::from_secs(10),
            Arc::new(emitter.clone()),
        )
    }

    fn controller(
        provider: impl SynthesisProvider + 'static,
    ) -> (SpeechSynthesisController, RecordingEmitter) {
        let emitter = RecordingEmitter::new();
        let ctrl = SpeechSynthesisController::new(
            Arc::new(provider),
            health(&emitter),
            Arc::new(emitter.clone()),
        );
        (ctrl, emitter)
    }

    #[tokio::test]
    async fn successful_request_returns_ready_session() {
        let mut provider = MockProvider::new();
        provider
            .expect_synthesize()
            .withf(|text, language| text == "In the name of God" && language == "en")
            .times(1)
            .returning(|_, _| Ok(audio()));
        let (ctrl, _emitter) = controller(provider);

        let session = ctrl.request("In the name of God", "en").await.unwrap();

        assert_eq!(session.audio, audio());
        assert_eq!(session.control.state(), SynthesisState::Ready);
        assert_eq!(ctrl.current(), Some(session.control.clone()));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_calling_provider() {
        let mut provider = MockProvider::new();
        provider.expect_synthesize().never();
        let (ctrl, _emitter) = controller(provider);

        assert_eq!(
            ctrl.request("   ", "en").await.unwrap_err(),
            SynthesisError::EmptyText
        );
    }

    #[tokio::test]
    async fn blank_request_still_supersedes_previous_session() {
        let mut provider = MockProvider::new();
        provider.expect_synthesize().times(1).returning(|_, _| Ok(audio()));
        let (ctrl, _emitter) = controller(provider);

        let first = ctrl.request("first", "en").await.unwrap();
        assert_eq!(
            ctrl.request("", "en").await.unwrap_err(),
            SynthesisError::EmptyText
        );

        assert_eq!(first.control.state(), SynthesisState::Cancelled);
        assert!(ctrl.current().is_none());
    }

    #[tokio::test]
    async fn unhealthy_provider_fails_fast() {
        let mut provider = MockProvider::new();
        provider.expect_synthesize().never();
        let (ctrl, _emitter) = controller(provider);
        ctrl.health().mark_unhealthy();

        let err = ctrl.request("text", "en").await.unwrap_err();

        assert_eq!(err, SynthesisError::ServiceUnavailable);
        assert!(ctrl.current().is_none());
        ctrl.health().shutdown();
    }

    #[tokio::test]
    async fn provider_failure_marks_unhealthy_and_leaves_no_session() {
        let mut provider = MockProvider::new();
        provider
            .expect_synthesize()
            .times(1)
            .returning(|_, _| Err(SynthesisProviderError::Status { status: 502 }));
        let (ctrl, emitter) = controller(provider);

        let err = ctrl.request("text", "en").await.unwrap_err();

        assert!(matches!(err, SynthesisError::Service(_)));
        assert!(ctrl.current().is_none());
        assert!(!ctrl.health().is_healthy());
        assert!(ctrl.health().has_pending_retry());
        assert!(
            emitter
                .events()
                .contains(&PlaybackEvent::HealthChanged { healthy: false })
        );
        ctrl.health().shutdown();
    }

    #[tokio::test]
    async fn empty_audio_is_a_service_failure() {
        let mut provider = MockProvider::new();
        provider
            .expect_synthesize()
            .returning(|_, _| Ok(SpeechAudio::new(Vec::new(), "audio/mpeg")));
        let (ctrl, _emitter) = controller(provider);

        assert!(matches!(
            ctrl.request("text", "en").await,
            Err(SynthesisError::Service(_))
        ));
        ctrl.health().shutdown();
    }

    #[tokio::test]
    async fn cancel_twice_fires_completion_once() {
        let mut provider = MockProvider::new();
        provider.expect_synthesize().returning(|_, _| Ok(audio()));
        let (ctrl, _emitter) = controller(provider);
        let session = ctrl.request("text", "en").await.unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        session.control.on_complete(move |state| {
            assert_eq!(state, SynthesisState::Cancelled);
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(session.control.cancel());
        assert!(!session.control.cancel());
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        assert!(ctrl.current().is_none());
    }

    #[tokio::test]
    async fn cancel_after_natural_completion_is_noop() {
        let mut provider = MockProvider::new();
        provider.expect_synthesize().returning(|_, _| Ok(audio()));
        let (ctrl, emitter) = controller(provider);
        let session = ctrl.request("text", "en").await.unwrap();

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        session.control.on_complete(move |_| {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        assert!(session.control.complete());
        assert!(!session.control.cancel());
        assert!(!session.control.complete());

        assert_eq!(session.control.state(), SynthesisState::Completed);
        assert_eq!(fired.load(Ordering::SeqCst), 1);
        let cancelled = emitter.events().into_iter().any(|e| {
            matches!(
                e,
                PlaybackEvent::SynthesisStateChanged {
                    state: SynthesisState::Cancelled,
                    ..
                }
            )
        });
        assert!(!cancelled);
    }

    #[tokio::test]
    async fn late_on_complete_runs_immediately() {
        let mut provider = MockProvider::new();
        provider.expect_synthesize().returning(|_, _| Ok(audio()));
        let (ctrl, _emitter) = controller(provider);
        let session = ctrl.request("text", "en").await.unwrap();
        session.control.complete();

        let fired = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&fired);
        session.control.on_complete(move |state| {
            assert_eq!(state, SynthesisState::Completed);
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(fired.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn new_request_supersedes_previous_session() {
        let mut provider = MockProvider::new();
        provider.expect_synthesize().times(2).returning(|_, _| Ok(audio()));
        let (ctrl, _emitter) = controller(provider);

        let first = ctrl.request("first", "en").await.unwrap();
        let second = ctrl.request("second", "en").await.unwrap();

        assert_eq!(first.control.state(), SynthesisState::Cancelled);
        assert_eq!(second.control.state(), SynthesisState::Ready);
        assert!(second.control.request_id() > first.control.request_id());
        assert_eq!(ctrl.current(), Some(second.control));
    }

    #[tokio::test]
    async fn in_flight_request_is_superseded() {
        let ctrl = Arc::new(controller(HangingProvider).0);

        let pending = tokio::spawn({
            let ctrl = Arc::clone(&ctrl);
            async move { ctrl.request("slow", "en").await }
        });
        // Let the first request reach the provider.
        while ctrl.current().is_none() {
            tokio::task::yield_now().await;
        }
        let first = ctrl.current().unwrap();

        // The replacement also hangs; cancel it explicitly afterwards.
        let second = tokio::spawn({
            let ctrl = Arc::clone(&ctrl);
            async move { ctrl.request("fast", "en").await }
        });
        while ctrl.current().is_none_or(|c| c == first) {
            tokio::task::yield_now().await;
        }

        assert_eq!(pending.await.unwrap().unwrap_err(), SynthesisError::Superseded);
        assert!(ctrl.cancel());
        assert_eq!(second.await.unwrap().unwrap_err(), SynthesisError::Cancelled);
        assert!(!ctrl.cancel());
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_is_a_service_failure() {
        let emitter = RecordingEmitter::new();
        let ctrl = SpeechSynthesisController::new(
            Arc::new(HangingProvider),
            health(&emitter),
            Arc::new(emitter.clone()),
        )
        .with_timeout(Some(Duration::from_secs(5)));

        let err = ctrl.request("text", "en").await.unwrap_err();

        assert_eq!(err, SynthesisError::Timeout(Duration::from_secs(5)));
        assert!(!ctrl.health().is_healthy());
        ctrl.health().shutdown();
    }
}
