//! Media backend port - opaque playable resources supplied by the platform.
//!
//! The core never decodes audio. A [`MediaBackend`] creates a
//! [`MediaResource`] for a URL and reports what happens to it through a
//! [`MediaListener`]. Listeners are attached per session and detached
//! synchronously on teardown, so a torn-down resource can no longer reach
//! its controller.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tokio::sync::mpsc;

use crate::domain::SessionId;
use crate::error::PlaybackError;

/// Why a media resource failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MediaFailure {
    /// Unreachable or empty resource.
    #[error("transport: {0}")]
    Transport(String),

    /// The resource loaded but could not be decoded or played.
    #[error("decode: {0}")]
    Decode(String),
}

impl From<MediaFailure> for PlaybackError {
    fn from(failure: MediaFailure) -> Self {
        match failure {
            MediaFailure::Transport(msg) => Self::Transport(msg),
            MediaFailure::Decode(msg) => Self::MediaDecode(msg),
        }
    }
}

/// Something that happened to a media resource.
#[derive(Debug, Clone, PartialEq)]
pub enum MediaSignal {
    /// Enough is buffered to start playing.
    Ready { duration: Option<f64> },
    /// Position update while playing.
    Progress { position: f64, duration: Option<f64> },
    /// Paused by the platform (headphones unplugged, OS media controls).
    Paused,
    /// Stopped because another recitation session took over.
    Interrupted,
    /// Played through to the end.
    Ended,
    /// Loading or playback failed.
    Failed(MediaFailure),
}

/// A signal tagged with the session it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct MediaEvent {
    pub session: SessionId,
    pub signal: MediaSignal,
}

/// Sending half of a session-scoped listener, handed to the backend.
///
/// Emitting through a detached listener is a silent no-op.
#[derive(Debug, Clone)]
pub struct MediaListener {
    session: SessionId,
    tx: mpsc::UnboundedSender<MediaEvent>,
    attached: Arc<AtomicBool>,
}

/// Controller-side half of a listener; detaches on drop.
#[derive(Debug)]
pub struct ListenerGuard {
    session: SessionId,
    attached: Arc<AtomicBool>,
}

impl MediaListener {
    /// Attach a listener for `session` that feeds the controller queue `tx`.
    #[must_use]
    pub fn attach(
        session: SessionId,
        tx: mpsc::UnboundedSender<MediaEvent>,
    ) -> (Self, ListenerGuard) {
        let attached = Arc::new(AtomicBool::new(true));
        let listener = Self {
            session,
            tx,
            attached: Arc::clone(&attached),
        };
        (listener, ListenerGuard { session, attached })
    }

    #[must_use]
    pub const fn session(&self) -> SessionId {
        self.session
    }

    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.attached.load(Ordering::SeqCst)
    }

    /// Queue a signal for the owning controller.
    ///
    /// Returns `false` when the listener was detached or the controller is gone.
    pub fn emit(&self, signal: MediaSignal) -> bool {
        if !self.is_attached() {
            tracing::trace!(session = %self.session, ?signal, "Listener detached, signal dropped");
            return false;
        }
        self.tx
            .send(MediaEvent {
                session: self.session,
                signal,
            })
            .is_ok()
    }
}

impl ListenerGuard {
    #[must_use]
    pub const fn session(&self) -> SessionId {
        self.session
    }

    /// Detach the listener. Idempotent.
    pub fn detach(&self) {
        if self.attached.swap(false, Ordering::SeqCst) {
            tracing::trace!(session = %self.session, "Media listener detached");
        }
    }
}

impl Drop for ListenerGuard {
    fn drop(&mut self) {
        self.detach();
    }
}

/// A platform audio resource.
///
/// Methods take `&self`; implementations use interior mutability so a
/// resource can be paused from outside its owning controller when another
/// session evicts it.
pub trait MediaResource: Send + Sync {
    fn play(&self);
    fn pause(&self);
    /// Move the playhead. `position` is already clamped by the caller.
    fn seek(&self, position: f64);
    /// Free the underlying resource. Called exactly once, on teardown.
    fn release(&self);
}

/// Factory for media resources.
pub trait MediaBackend: Send + Sync {
    /// Create a resource for `url` and begin buffering.
    ///
    /// The backend reports readiness, progress, end and failures through
    /// `listener`.
    fn open(&self, url: &str, listener: MediaListener)
    -> Result<Arc<dyn MediaResource>, MediaFailure>;
}
