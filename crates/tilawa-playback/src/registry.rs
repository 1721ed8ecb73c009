//! Process-wide record of the single audible recitation session.
//!
//! At most one [`PlaybackHandle`] is active at any instant. Registering a new
//! handle stops whichever handle was active before it. Clearing is
//! compare-and-clear: a controller can only clear the slot while its own
//! handle is still the registered one, so a late completion from an older
//! session never clobbers a newer one.
//!
//! Registration on `Ready` is ordered by claims: every started session takes
//! a claim number, and an automatic registration is refused once a newer
//! claim has been issued. Buffering speed therefore cannot let an older
//! request evict a newer one.
//!
//! The registry is a cheap `Clone` (shared `Arc`) and is passed explicitly
//! to every controller that plays recitation audio.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tilawa_core::{SessionId, SessionState, SourceKey};
use tracing::debug;

type Stopper = Box<dyn Fn() + Send + Sync>;

struct HandleInner {
    session: SessionId,
    source: SourceKey,
    url: String,
    state: Mutex<SessionState>,
    /// Claim number issued by the registry; 0 until claimed.
    claim: AtomicU64,
    stopper: Stopper,
}

/// Shared view of one playback attempt.
///
/// Clones refer to the same attempt; equality is session identity.
#[derive(Clone)]
pub struct PlaybackHandle {
    inner: Arc<HandleInner>,
}

impl PlaybackHandle {
    /// Create a handle. `stopper` is invoked when another session evicts this one.
    pub fn new(
        session: SessionId,
        source: SourceKey,
        url: impl Into<String>,
        stopper: impl Fn() + Send + Sync + 'static,
    ) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                session,
                source,
                url: url.into(),
                state: Mutex::new(SessionState::Loading),
                claim: AtomicU64::new(0),
                stopper: Box::new(stopper),
            }),
        }
    }

    #[must_use]
    pub fn session(&self) -> SessionId {
        self.inner.session
    }

    #[must_use]
    pub fn source(&self) -> &SourceKey {
        &self.inner.source
    }

    #[must_use]
    pub fn url(&self) -> &str {
        &self.inner.url
    }

    /// Last state reported by the owning controller.
    #[must_use]
    pub fn state(&self) -> SessionState {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn set_state(&self, state: SessionState) {
        *self.inner.state.lock().unwrap_or_else(PoisonError::into_inner) = state;
    }

    fn claim(&self) -> u64 {
        self.inner.claim.load(Ordering::SeqCst)
    }

    fn set_claim(&self, claim: u64) {
        self.inner.claim.store(claim, Ordering::SeqCst);
    }

    /// Ask the owning controller's resource to stop.
    pub fn stop(&self) {
        (self.inner.stopper)();
    }
}

impl PartialEq for PlaybackHandle {
    fn eq(&self, other: &Self) -> bool {
        self.inner.session == other.inner.session
    }
}

impl Eq for PlaybackHandle {}

impl fmt::Debug for PlaybackHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackHandle")
            .field("session", &self.inner.session)
            .field("source", &self.inner.source)
            .field("url", &self.inner.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

/// Result of [`PlaybackRegistry::register_autoplay`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Autoplay {
    /// The handle is now active; `evicted` was stopped.
    Registered { evicted: Option<PlaybackHandle> },
    /// A newer session claimed playback first. Nothing changed.
    Superseded,
}

#[derive(Default)]
struct Slot {
    active: Option<PlaybackHandle>,
    latest_claim: u64,
}

/// Holder of the single active recitation handle.
#[derive(Clone, Default)]
pub struct PlaybackRegistry {
    slot: Arc<Mutex<Slot>>,
}

impl PlaybackRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Give `handle` the newest claim on playback.
    ///
    /// Called when a session starts, before its media is ready.
    pub fn claim(&self, handle: &PlaybackHandle) {
        let mut slot = self.lock();
        slot.latest_claim += 1;
        handle.set_claim(slot.latest_claim);
        debug!(session = %handle.session(), claim = slot.latest_claim, "Claimed playback");
    }

    /// Record `handle` as active, stopping any different handle first.
    ///
    /// This is an explicit user action, so it always wins and takes the
    /// newest claim. Returns the evicted handle, if any. Registering the
    /// handle that is already active is a no-op. The stop is issued after
    /// the slot lock is released, so a stopper may safely query the registry.
    pub fn register(&self, handle: &PlaybackHandle) -> Option<PlaybackHandle> {
        let evicted = {
            let mut slot = self.lock();
            if slot.active.as_ref() == Some(handle) {
                return None;
            }
            slot.latest_claim += 1;
            handle.set_claim(slot.latest_claim);
            slot.active.replace(handle.clone())
        };
        Self::stop_evicted(handle, evicted.as_ref());
        evicted
    }

    /// Register `handle` because its media became ready, unless a newer
    /// claim was issued since it started.
    pub fn register_autoplay(&self, handle: &PlaybackHandle) -> Autoplay {
        let evicted = {
            let mut slot = self.lock();
            if slot.active.as_ref() == Some(handle) {
                return Autoplay::Registered { evicted: None };
            }
            if handle.claim() < slot.latest_claim {
                debug!(
                    session = %handle.session(),
                    claim = handle.claim(),
                    latest = slot.latest_claim,
                    "Newer session claimed playback, refusing autoplay"
                );
                return Autoplay::Superseded;
            }
            slot.active.replace(handle.clone())
        };
        Self::stop_evicted(handle, evicted.as_ref());
        Autoplay::Registered { evicted }
    }

    fn stop_evicted(handle: &PlaybackHandle, evicted: Option<&PlaybackHandle>) {
        if let Some(previous) = evicted {
            debug!(
                evicted = %previous.session(),
                active = %handle.session(),
                "Evicting previous recitation session"
            );
            previous.stop();
        } else {
            debug!(active = %handle.session(), "Registered recitation session");
        }
    }

    /// Clear the slot only if `handle` is still the registered one.
    ///
    /// Returns whether the slot was cleared.
    pub fn clear(&self, handle: &PlaybackHandle) -> bool {
        let mut slot = self.lock();
        if slot.active.as_ref() == Some(handle) {
            slot.active = None;
            debug!(session = %handle.session(), "Cleared active recitation session");
            true
        } else {
            false
        }
    }

    /// The active handle, if any.
    #[must_use]
    pub fn query(&self) -> Option<PlaybackHandle> {
        self.lock().active.clone()
    }

    /// Whether `session` is the registered one.
    #[must_use]
    pub fn is_active(&self, session: SessionId) -> bool {
        self.lock()
            .active
            .as_ref()
            .is_some_and(|h| h.session() == session)
    }

    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for PlaybackRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlaybackRegistry")
            .field("active", &self.query().map(|h| h.session()))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tilawa_core::{SessionSequence, VerseKey};

    fn handle(seq: &mut SessionSequence, stops: &Arc<AtomicUsize>) -> PlaybackHandle {
        let stops = Arc::clone(stops);
        PlaybackHandle::new(
            seq.next_id(),
            SourceKey::Verse(VerseKey::new(1, 1).unwrap()),
            "https://audio.test/001001.mp3",
            move || {
                stops.fetch_add(1, Ordering::SeqCst);
            },
        )
    }

    #[test]
    fn register_on_empty_slot_stops_nothing() {
        let registry = PlaybackRegistry::new();
        let stops = Arc::new(AtomicUsize::new(0));
        let mut seq = SessionSequence::new();
        let a = handle(&mut seq, &stops);

        assert!(registry.register(&a).is_none());
        assert_eq!(registry.query(), Some(a.clone()));
        assert!(registry.is_active(a.session()));
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn register_evicts_and_stops_previous() {
        let registry = PlaybackRegistry::new();
        let a_stops = Arc::new(AtomicUsize::new(0));
        let b_stops = Arc::new(AtomicUsize::new(0));
        let mut seq_a = SessionSequence::new();
        let mut seq_b = SessionSequence::new();
        let a = handle(&mut seq_a, &a_stops);
        let b = handle(&mut seq_b, &b_stops);

        registry.register(&a);
        let evicted = registry.register(&b);

        assert_eq!(evicted, Some(a));
        assert_eq!(registry.query(), Some(b));
        assert_eq!(a_stops.load(Ordering::SeqCst), 1);
        assert_eq!(b_stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn re_registering_active_handle_is_noop() {
        let registry = PlaybackRegistry::new();
        let stops = Arc::new(AtomicUsize::new(0));
        let mut seq = SessionSequence::new();
        let a = handle(&mut seq, &stops);

        registry.register(&a);
        assert!(registry.register(&a).is_none());
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn clear_is_compare_and_clear() {
        let registry = PlaybackRegistry::new();
        let stops = Arc::new(AtomicUsize::new(0));
        let mut seq = SessionSequence::new();
        let old = handle(&mut seq, &stops);
        let new = handle(&mut seq, &stops);

        registry.register(&old);
        registry.register(&new);

        // Late completion from the evicted session must not clear the new one.
        assert!(!registry.clear(&old));
        assert_eq!(registry.query(), Some(new.clone()));

        assert!(registry.clear(&new));
        assert!(registry.query().is_none());
        assert!(!registry.clear(&new));
    }

    #[test]
    fn clones_share_the_slot() {
        let registry = PlaybackRegistry::new();
        let other = registry.clone();
        let stops = Arc::new(AtomicUsize::new(0));
        let mut seq = SessionSequence::new();
        let a = handle(&mut seq, &stops);

        registry.register(&a);
        assert_eq!(other.query(), Some(a));
    }

    #[test]
    fn autoplay_of_an_older_claim_is_refused() {
        let registry = PlaybackRegistry::new();
        let stops = Arc::new(AtomicUsize::new(0));
        let mut seq_a = SessionSequence::new();
        let mut seq_b = SessionSequence::new();
        let a = handle(&mut seq_a, &stops);
        let b = handle(&mut seq_b, &stops);

        registry.claim(&a);
        registry.claim(&b);

        assert_eq!(
            registry.register_autoplay(&b),
            Autoplay::Registered { evicted: None }
        );
        assert_eq!(registry.register_autoplay(&a), Autoplay::Superseded);
        assert_eq!(registry.query(), Some(b));
        assert_eq!(stops.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn explicit_register_overrides_newer_claims() {
        let registry = PlaybackRegistry::new();
        let stops = Arc::new(AtomicUsize::new(0));
        let mut seq_a = SessionSequence::new();
        let mut seq_b = SessionSequence::new();
        let mut seq_c = SessionSequence::new();
        let a = handle(&mut seq_a, &stops);
        let b = handle(&mut seq_b, &stops);
        let c = handle(&mut seq_c, &stops);

        registry.claim(&a);
        registry.claim(&b);
        registry.claim(&c);
        assert_eq!(registry.register(&a), None);

        // A resumed by the user now outranks both pending sessions.
        assert_eq!(registry.register_autoplay(&b), Autoplay::Superseded);
        assert_eq!(registry.register_autoplay(&c), Autoplay::Superseded);
        assert!(registry.is_active(a.session()));
    }

    #[test]
    fn handle_state_is_shared_between_clones() {
        let stops = Arc::new(AtomicUsize::new(0));
        let mut seq = SessionSequence::new();
        let a = handle(&mut seq, &stops);
        let a2 = a.clone();

        assert_eq!(a.state(), SessionState::Loading);
        a.set_state(SessionState::Playing);
        assert_eq!(a2.state(), SessionState::Playing);
    }
}
