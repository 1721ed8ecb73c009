//! Event emitter port for observer callbacks.
//!
//! Implementations handle transport details (channels, UI bridges, logs).

use tokio::sync::mpsc;

use crate::events::PlaybackEvent;

/// Trait for emitting playback events to the UI layer.
///
/// This abstraction keeps callback plumbing consistent across controllers and
/// prevents channel types from becoming part of the public API surface.
///
/// # Implementations
///
/// - [`NoopEmitter`] - For tests and contexts that don't listen
/// - [`ChannelEmitter`] - Forwards into a tokio unbounded channel
pub trait PlaybackEventEmitter: Send + Sync {
    /// Emit a playback event.
    ///
    /// This method must not block.
    fn emit(&self, event: PlaybackEvent);

    /// Clone this emitter into a boxed trait object.
    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter>;
}

/// A no-op event emitter.
#[derive(Debug, Clone, Default)]
pub struct NoopEmitter;

impl NoopEmitter {
    /// Create a new no-op emitter.
    pub const fn new() -> Self {
        Self
    }
}

impl PlaybackEventEmitter for NoopEmitter {
    fn emit(&self, _event: PlaybackEvent) {}

    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter> {
        Box::new(self.clone())
    }
}

/// Emitter that forwards events into an unbounded channel.
///
/// Emission is best-effort: if the receiver is dropped the event is logged
/// and discarded.
#[derive(Debug, Clone)]
pub struct ChannelEmitter {
    tx: mpsc::UnboundedSender<PlaybackEvent>,
}

impl ChannelEmitter {
    /// Create an emitter and the receiver that observes it.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PlaybackEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl PlaybackEventEmitter for ChannelEmitter {
    fn emit(&self, event: PlaybackEvent) {
        let name = event.name();
        if self.tx.send(event).is_err() {
            tracing::warn!(event = name, "Playback event receiver dropped");
        }
    }

    fn clone_box(&self) -> Box<dyn PlaybackEventEmitter> {
        Box::new(self.clone())
    }
}
