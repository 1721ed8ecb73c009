//! Availability monitoring of the speech synthesis provider.
//!
//! The monitor starts optimistic (`healthy = true`). A failed probe, or a
//! consumer reporting a failed synthesis through
//! [`HealthMonitor::mark_unhealthy`], flips it to unhealthy and schedules a
//! single retry after a fixed interval. Further failures replace the
//! pending retry rather than adding another, so at most one retry timer is
//! ever live. A successful probe cancels it.
//!
//! [`HealthMonitor::start`] probes immediately and then on a fixed period
//! until [`HealthMonitor::shutdown`], which cancels every pending timer.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;

use tilawa_core::{HealthProbe, PlaybackEvent, PlaybackEventEmitter, Settings};
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::schedule::ScheduledTask;

struct PendingRetry {
    generation: u64,
    task: ScheduledTask,
}

#[derive(Default)]
struct MonitorState {
    healthy: bool,
    retry: Option<PendingRetry>,
    generation: u64,
    periodic: Option<JoinHandle<()>>,
}

struct Inner {
    probe: Arc<dyn HealthProbe>,
    probe_interval: Duration,
    retry_interval: Duration,
    emitter: Arc<dyn PlaybackEventEmitter>,
    state: Mutex<MonitorState>,
    shutdown: CancellationToken,
}

impl Drop for Inner {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

/// Shared health view of the synthesis provider.
///
/// Cheap to clone; clones observe and drive the same state.
#[derive(Clone)]
pub struct HealthMonitor {
    inner: Arc<Inner>,
}

impl HealthMonitor {
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        probe_interval: Duration,
        retry_interval: Duration,
        emitter: Arc<dyn PlaybackEventEmitter>,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                probe,
                probe_interval,
                retry_interval,
                emitter,
                state: Mutex::new(MonitorState {
                    healthy: true,
                    ..MonitorState::default()
                }),
                shutdown: CancellationToken::new(),
            }),
        }
    }

    /// Create a monitor using the intervals from `settings`.
    pub fn from_settings(
        probe: Arc<dyn HealthProbe>,
        settings: &Settings,
        emitter: Arc<dyn PlaybackEventEmitter>,
    ) -> Self {
        Self::new(
            probe,
            settings.effective_probe_interval(),
            settings.effective_retry_interval(),
            emitter,
        )
    }

    #[must_use]
    pub fn is_healthy(&self) -> bool {
        self.lock().healthy
    }

    /// Whether a retry timer is scheduled and has not fired yet.
    #[must_use]
    pub fn has_pending_retry(&self) -> bool {
        self.lock().retry.is_some()
    }

    /// Run one availability check and record the result.
    pub async fn probe(&self) -> bool {
        match self.inner.probe.check().await {
            Ok(()) => {
                self.record_success();
                true
            }
            Err(e) => {
                warn!(error = %e, "Synthesis provider health probe failed");
                self.record_failure();
                false
            }
        }
    }

    /// Report a failure observed outside the monitor.
    ///
    /// Same effect as a failed [`probe`](Self::probe).
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime, since the retry is
    /// spawned on the current runtime.
    pub fn mark_unhealthy(&self) {
        debug!("Synthesis provider marked unhealthy by consumer");
        self.record_failure();
    }

    /// Probe now, then every probe interval until shutdown.
    ///
    /// Calling `start` again while running is a no-op.
    ///
    /// # Panics
    ///
    /// Panics when called outside a Tokio runtime.
    pub fn start(&self) {
        let mut state = self.lock();
        if state.periodic.is_some() || self.inner.shutdown.is_cancelled() {
            return;
        }

        let weak = Arc::downgrade(&self.inner);
        let shutdown = self.inner.shutdown.clone();
        let period = self.inner.probe_interval;
        info!(interval = ?period, "Starting synthesis health monitor");

        state.periodic = Some(tokio::spawn(async move {
            let mut ticker = interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let Some(monitor) = Self::upgrade(&weak) else {
                            break;
                        };
                        monitor.probe().await;
                    }
                    () = shutdown.cancelled() => {
                        debug!("Health monitor loop cancelled");
                        break;
                    }
                }
            }
        }));
    }

    /// Stop periodic probing and cancel any pending retry.
    pub fn shutdown(&self) {
        self.inner.shutdown.cancel();
        let mut state = self.lock();
        if let Some(retry) = state.retry.take() {
            retry.task.cancel();
        }
        state.periodic = None;
        info!("Synthesis health monitor shut down");
    }

    fn record_success(&self) {
        let changed = {
            let mut state = self.lock();
            if let Some(retry) = state.retry.take() {
                retry.task.cancel();
            }
            !std::mem::replace(&mut state.healthy, true)
        };
        if changed {
            info!("Synthesis provider is healthy again");
            self.inner
                .emitter
                .emit(PlaybackEvent::HealthChanged { healthy: true });
        }
    }

    fn record_failure(&self) {
        let changed = {
            let mut state = self.lock();
            let changed = std::mem::replace(&mut state.healthy, false);

            if !self.inner.shutdown.is_cancelled() {
                state.generation += 1;
                let generation = state.generation;
                let weak = Arc::downgrade(&self.inner);
                let task = ScheduledTask::after(self.inner.retry_interval, async move {
                    if let Some(monitor) = Self::upgrade(&weak) {
                        monitor.retry_fired(generation);
                        monitor.probe().await;
                    }
                });
                // Replacing the slot drops, and so cancels, any earlier retry.
                state.retry = Some(PendingRetry { generation, task });
                debug!(retry_in = ?self.inner.retry_interval, generation, "Scheduled health retry");
            }
            changed
        };
        if changed {
            warn!("Synthesis provider is unavailable");
            self.inner
                .emitter
                .emit(PlaybackEvent::HealthChanged { healthy: false });
        }
    }

    /// Clear the retry slot if it still holds the retry that just fired.
    fn retry_fired(&self, generation: u64) {
        let mut state = self.lock();
        if state
            .retry
            .as_ref()
            .is_some_and(|r| r.generation == generation)
        {
            state.retry = None;
        }
    }

    fn upgrade(weak: &Weak<Inner>) -> Option<Self> {
        weak.upgrade().map(|inner| Self { inner })
    }

    fn lock(&self) -> MutexGuard<'_, MonitorState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for HealthMonitor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("HealthMonitor")
            .field("healthy", &state.healthy)
            .field("pending_retry", &state.retry.is_some())
            .field("running", &state.periodic.is_some())
            .finish_non_exhaustive()
    }
}
