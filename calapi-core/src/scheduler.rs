//! Periodic background refresh of the aggregation cache.
//!
//! The scheduler owns exactly one timer task at a time. The task holds a
//! cancellation token; restarting cancels and joins the old task before a new
//! one is spawned, so a new interval takes effect without the timers
//! overlapping.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument};

use crate::cache::AggregationCache;

struct RunningTimer {
    interval: Duration,
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

pub struct RefreshScheduler {
    cache: Arc<AggregationCache>,
    running: Option<RunningTimer>,
}

impl RefreshScheduler {
    pub fn new(cache: Arc<AggregationCache>) -> Self {
        RefreshScheduler {
            cache,
            running: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// The interval of the running timer.
    pub fn interval(&self) -> Option<Duration> {
        self.running.as_ref().map(|timer| timer.interval)
    }

    /// Refresh now, then every `interval`. Replaces a running timer.
    #[instrument(skip(self))]
    pub async fn start(&mut self, interval: Duration) {
        self.stop().await;

        let cancel = CancellationToken::new();
        let handle = tokio::spawn(run(Arc::clone(&self.cache), interval, cancel.clone()));

        self.running = Some(RunningTimer {
            interval,
            cancel,
            handle,
        });
        info!(
            interval = %humantime::format_duration(interval),
            "Refresh scheduler started"
        );
    }

    /// Stop the current timer and start a new one with `interval`.
    pub async fn restart(&mut self, interval: Duration) {
        info!("Restarting refresh scheduler");
        self.start(interval).await;
    }

    /// Cancel the timer and wait for its task to finish. An in-flight refresh
    /// is abandoned without publishing.
    #[instrument(skip(self))]
    pub async fn stop(&mut self) {
        let Some(timer) = self.running.take() else {
            return;
        };

        timer.cancel.cancel();
        if let Err(e) = timer.handle.await {
            error!(error = %e, "Refresh scheduler task failed");
        }
        info!("Refresh scheduler stopped");
    }
}

async fn run(cache: Arc<AggregationCache>, interval: Duration, cancel: CancellationToken) {
    // The first tick completes immediately.
    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let snapshot = cache.refresh(&cancel).await;
                debug!(generation = snapshot.generation, "Scheduled refresh finished");
            }
        }
    }
}
