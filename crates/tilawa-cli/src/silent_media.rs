//! A media backend that keeps time but makes no sound.
//!
//! Each opened resource runs a small clock task: it reports `Ready` after a
//! short buffering delay, advances its position while playing, reports
//! progress on every tick, and reports `Ended` when the position reaches
//! the configured duration. Useful for driving playlists from a terminal.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tilawa_core::{MediaBackend, MediaFailure, MediaListener, MediaResource, MediaSignal};
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Transport {
    Paused,
    Playing,
    Released,
}

/// Backend whose resources are silent media clocks.
#[derive(Debug, Clone)]
pub struct SilentBackend {
    duration: f64,
    buffering: Duration,
    tick: Duration,
}

impl SilentBackend {
    /// Every resource lasts `duration` seconds.
    #[must_use]
    pub const fn new(duration: f64) -> Self {
        Self {
            duration,
            buffering: Duration::from_millis(50),
            tick: Duration::from_millis(250),
        }
    }

    #[must_use]
    pub const fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    #[must_use]
    pub const fn with_buffering(mut self, buffering: Duration) -> Self {
        self.buffering = buffering;
        self
    }
}

struct SilentResource {
    transport: watch::Sender<Transport>,
    position: Arc<Mutex<f64>>,
}

impl MediaResource for SilentResource {
    fn play(&self) {
        self.transport.send_if_modified(|t| {
            let changed = *t == Transport::Paused;
            if changed {
                *t = Transport::Playing;
            }
            changed
        });
    }

    fn pause(&self) {
        self.transport.send_if_modified(|t| {
            let changed = *t == Transport::Playing;
            if changed {
                *t = Transport::Paused;
            }
            changed
        });
    }

    fn seek(&self, position: f64) {
        *self.position.lock().unwrap_or_else(PoisonError::into_inner) = position;
    }

    fn release(&self) {
        self.transport.send_replace(Transport::Released);
    }
}

impl MediaBackend for SilentBackend {
    fn open(
        &self,
        url: &str,
        listener: MediaListener,
    ) -> Result<Arc<dyn MediaResource>, MediaFailure> {
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| MediaFailure::Transport(format!("no media clock available: {e}")))?;

        let (transport, rx) = watch::channel(Transport::Paused);
        let position = Arc::new(Mutex::new(0.0));
        debug!(%url, session = %listener.session(), "Opening silent media clock");

        runtime.spawn(run_clock(
            listener,
            rx,
            Arc::clone(&position),
            self.clone(),
        ));
        Ok(Arc::new(SilentResource {
            transport,
            position,
        }))
    }
}

async fn run_clock(
    listener: MediaListener,
    mut rx: watch::Receiver<Transport>,
    position: Arc<Mutex<f64>>,
    config: SilentBackend,
) {
    tokio::time::sleep(config.buffering).await;
    if !listener.emit(MediaSignal::Ready {
        duration: Some(config.duration),
    }) {
        return;
    }

    loop {
        let transport = *rx.borrow_and_update();
        match transport {
            Transport::Released => return,
            Transport::Paused => {
                if rx.changed().await.is_err() {
                    return;
                }
            }
            Transport::Playing => {
                tokio::select! {
                    changed = rx.changed() => {
                        if changed.is_err() {
                            return;
                        }
                    }
                    () = tokio::time::sleep(config.tick) => {
                        let now = {
                            let mut pos = position.lock().unwrap_or_else(PoisonError::into_inner);
                            *pos = (*pos + config.tick.as_secs_f64()).min(config.duration);
                            *pos
                        };
                        if !listener.emit(MediaSignal::Progress {
                            position: now,
                            duration: Some(config.duration),
                        }) {
                            return;
                        }
                        if now >= config.duration {
                            listener.emit(MediaSignal::Ended);
                            return;
                        }
                    }
                }
            }
        }
    }
}
