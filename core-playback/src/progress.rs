//! # Progress Publisher
//!
//! Recurring sampler that reports playhead position while a track plays.
//!
//! At most one cycle runs at a time. [`ProgressPublisher::start`] replaces a
//! running cycle, and [`ProgressPublisher::stop`] is idempotent. The first
//! tick fires one interval after `start`; missed ticks are delayed rather than
//! burst.

use crate::types::ProgressEvent;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Default tick cadence.
pub const DEFAULT_PROGRESS_INTERVAL: Duration = Duration::from_millis(1000);

struct Cycle {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Owns the cancellable ticking task. Must be used inside a Tokio runtime.
pub struct ProgressPublisher {
    interval: Duration,
    cycle: Option<Cycle>,
}

impl ProgressPublisher {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            cycle: None,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Start sampling `poll` every interval and hand each snapshot to
    /// `on_tick`. A cycle that is already running is stopped first.
    pub fn start<P, T>(&mut self, poll: P, on_tick: T)
    where
        P: Fn() -> (Duration, Duration) + Send + 'static,
        T: Fn(ProgressEvent) + Send + 'static,
    {
        self.stop();

        let cancel = CancellationToken::new();
        let token = cancel.clone();
        let period = self.interval;

        let handle = tokio::spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let (position, duration) = poll();
                        let progress = ProgressEvent::new(position, duration);
                        trace!(position_ms = progress.position_ms, duration_ms = progress.duration_ms, "progress tick");
                        on_tick(progress);
                    }
                }
            }
        });

        self.cycle = Some(Cycle { cancel, handle });
    }

    /// Stop the running cycle, if any. No tick is delivered after this returns
    /// unless one is already executing.
    pub fn stop(&mut self) {
        if let Some(cycle) = self.cycle.take() {
            cycle.cancel.cancel();
            cycle.handle.abort();
        }
    }

    pub fn is_running(&self) -> bool {
        self.cycle
            .as_ref()
            .map_or(false, |cycle| !cycle.handle.is_finished())
    }
}

impl Default for ProgressPublisher {
    fn default() -> Self {
        Self::new(DEFAULT_PROGRESS_INTERVAL)
    }
}

impl Drop for ProgressPublisher {
    fn drop(&mut self) {
        self.stop();
    }
}
