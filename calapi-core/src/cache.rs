//! The aggregation cache.
//!
//! A refresh fans out over every configured source concurrently, merges what
//! comes back and then publishes the merged list as a new [`Snapshot`].
//! Readers only ever see complete snapshots: the published pointer is
//! swapped under a write lock that is never held across I/O.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{Instrument, debug, error, info, info_span, instrument, warn};

use crate::config::ConfigProvider;
use crate::date_range::DateRange;
use crate::event::{Event, Snapshot};
use crate::source::{SourceFetcher, load_events};

/// Time kept back from a caller's deadline for merging and publishing.
pub const MERGE_MARGIN: Duration = Duration::from_millis(250);

/// Events gathered during one refresh cycle.
#[derive(Debug, Default)]
struct Accumulator {
    last_updated: Option<DateTime<Utc>>,
    entries: Vec<Event>,
}

pub struct AggregationCache {
    config: Arc<dyn ConfigProvider>,
    fetcher: SourceFetcher,
    published: RwLock<Option<Arc<Snapshot>>>,
    // Serializes refresh cycles; never taken by readers.
    refresh_lock: Mutex<()>,
}

impl AggregationCache {
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        AggregationCache {
            config,
            fetcher: SourceFetcher::new(),
            published: RwLock::new(None),
            refresh_lock: Mutex::new(()),
        }
    }

    /// The latest published snapshot, or `None` before the first refresh.
    pub async fn published(&self) -> Option<Arc<Snapshot>> {
        self.published.read().await.clone()
    }

    /// The latest published snapshot. On a cold cache this runs a refresh
    /// first and waits for it.
    pub async fn read(&self) -> Arc<Snapshot> {
        if let Some(snapshot) = self.published().await {
            return snapshot;
        }

        let _guard = self.refresh_lock.lock().await;
        // Another refresh may have published while we waited for the lock.
        if let Some(snapshot) = self.published().await {
            return snapshot;
        }

        info!("Experiencing cold start, fetching events now");
        self.refresh_locked(&CancellationToken::new(), None).await
    }

    /// Run one refresh cycle and return the snapshot published by it.
    ///
    /// If `cancel` fires mid-cycle nothing is published and the previous
    /// snapshot (or an empty one) is returned.
    pub async fn refresh(&self, cancel: &CancellationToken) -> Arc<Snapshot> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked(cancel, None).await
    }

    /// Like [`refresh`](Self::refresh), but every source fetch is also cut off
    /// [`MERGE_MARGIN`] before `deadline`, so that slow sources fail on their
    /// own and the others still get published in time.
    ///
    /// If the deadline has already passed once the refresh lock is acquired,
    /// nothing is fetched and the current snapshot is returned.
    pub async fn refresh_until(&self, cancel: &CancellationToken, deadline: Instant) -> Arc<Snapshot> {
        let _guard = self.refresh_lock.lock().await;
        self.refresh_locked(cancel, Some(deadline)).await
    }

    #[instrument(name = "refresh", skip_all)]
    async fn refresh_locked(
        &self,
        cancel: &CancellationToken,
        deadline: Option<Instant>,
    ) -> Arc<Snapshot> {
        let mut timeout = self.config.fetch_timeout();
        if let Some(deadline) = deadline {
            let remaining = deadline
                .saturating_duration_since(Instant::now())
                .saturating_sub(MERGE_MARGIN);
            if remaining.is_zero() {
                warn!("Refresh deadline already passed, keeping the current snapshot");
                return self
                    .published()
                    .await
                    .unwrap_or_else(|| Arc::new(Snapshot::empty()));
            }
            timeout = timeout.min(remaining);
        }

        let sources = self.config.calendars();
        let rules = Arc::new(self.config.rules());
        let range = DateRange::today();

        debug!(
            sources = sources.len(),
            rules = rules.len(),
            fetch_timeout_ms = timeout.as_millis() as u64,
            from = %range.from,
            to = %range.to,
            "Starting refresh"
        );

        let accumulator = Arc::new(Mutex::new(Accumulator::default()));
        let mut tasks = JoinSet::new();

        for source in sources {
            let fetcher = self.fetcher.clone();
            let rules = Arc::clone(&rules);
            let cancel = cancel.clone();
            let accumulator = Arc::clone(&accumulator);
            let span = info_span!("calendar", name = %source.name);

            tasks.spawn(
                async move {
                    let started = Instant::now();
                    let events =
                        match load_events(&fetcher, &source, &rules, &range, timeout, &cancel)
                            .await
                        {
                            Ok(events) => events,
                            Err(e) => {
                                error!(error = %e, "Unable to load events");
                                Vec::new()
                            }
                        };
                    let count = events.len();

                    {
                        let mut merged = accumulator.lock().await;
                        merged.entries.extend(events);
                        merged.last_updated = Some(Utc::now());
                    }

                    info!(
                        events = count,
                        elapsed_ms = started.elapsed().as_millis() as u64,
                        "Refreshed calendar"
                    );
                }
                .instrument(span),
            );
        }

        while let Some(joined) = tasks.join_next().await {
            if let Err(e) = joined {
                error!(error = %e, "Calendar refresh task failed");
            }
        }

        let previous = self.published().await;

        if cancel.is_cancelled() {
            warn!("Refresh cancelled, keeping the previous snapshot");
            return previous.unwrap_or_else(|| Arc::new(Snapshot::empty()));
        }

        let merged = std::mem::take(&mut *accumulator.lock().await);
        let snapshot = Arc::new(Snapshot {
            generation: previous.map_or(0, |s| s.generation) + 1,
            last_updated: merged.last_updated.unwrap_or_else(Utc::now),
            entries: merged.entries,
        });

        *self.published.write().await = Some(Arc::clone(&snapshot));

        info!(
            generation = snapshot.generation,
            events = snapshot.entries.len(),
            "Published snapshot"
        );

        snapshot
    }
}
