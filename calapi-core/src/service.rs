//! The operations the API layer calls.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::cache::{AggregationCache, MERGE_MARGIN};
use crate::config::ConfigProvider;
use crate::error::{CalApiError, CalApiResult};
use crate::event::{CustomStatus, Event};
use crate::filter::CalendarFilter;
use crate::resolver::current_event;
use crate::status::CustomStatusStore;

/// Upper bound for administrative refreshes triggered through the API.
pub const FORCE_REFRESH_TIMEOUT: Duration = Duration::from_secs(10);

/// Extra time past the deadline before a forced refresh is abandoned, e.g.
/// while it still waits for a scheduled refresh to finish.
const BACKSTOP_GRACE: Duration = Duration::from_secs(1);

/// A snapshot narrowed to one calendar (or all of them).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarResponse {
    pub calendar_name: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_updated: DateTime<Utc>,
    pub entries: Vec<Event>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshResponse {
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_updated: DateTime<Utc>,
}

pub struct CalendarService {
    cache: Arc<AggregationCache>,
    statuses: CustomStatusStore,
}

impl CalendarService {
    pub fn new(config: Arc<dyn ConfigProvider>) -> Self {
        Self::with_cache(Arc::new(AggregationCache::new(config)))
    }

    pub fn with_cache(cache: Arc<AggregationCache>) -> Self {
        CalendarService {
            cache,
            statuses: CustomStatusStore::new(),
        }
    }

    /// The cache, shared with the refresh scheduler.
    pub fn cache(&self) -> &Arc<AggregationCache> {
        &self.cache
    }

    pub async fn get_snapshot(&self, filter: &CalendarFilter) -> CalendarResponse {
        let snapshot = self.cache.read().await;

        let mut entries: Vec<Event> = snapshot
            .entries
            .iter()
            .filter(|event| filter.matches(&event.calendar_name))
            .cloned()
            .collect();
        entries.sort_by_key(|event| event.start);

        CalendarResponse {
            calendar_name: filter.name().to_string(),
            last_updated: snapshot.last_updated,
            entries,
        }
    }

    pub async fn get_current_event(&self, filter: &CalendarFilter) -> Option<Event> {
        let snapshot = self.cache.read().await;
        current_event(&snapshot, filter, Utc::now()).cloned()
    }

    /// Refresh now and wait for it.
    ///
    /// Source fetches are cut off shortly before `timeout` runs out, so a stuck
    /// source only loses its own events. The whole call is abandoned only if it
    /// overruns `timeout` by a further grace period.
    pub async fn force_refresh(&self, timeout: Duration) -> CalApiResult<RefreshResponse> {
        info!("Forcing calendar refresh");
        let cancel = CancellationToken::new();
        let deadline = tokio::time::Instant::now() + timeout;
        let backstop = deadline + BACKSTOP_GRACE.max(MERGE_MARGIN);

        tokio::select! {
            snapshot = self.cache.refresh_until(&cancel, deadline) => Ok(RefreshResponse {
                last_updated: snapshot.last_updated,
            }),
            _ = tokio::time::sleep_until(backstop) => {
                cancel.cancel();
                warn!(timeout_ms = timeout.as_millis() as u64, "Forced refresh timed out");
                Err(CalApiError::Timeout(timeout))
            }
        }
    }

    pub async fn get_custom_status(&self, calendar: &str) -> CustomStatus {
        self.statuses.get(calendar).await
    }

    pub async fn set_custom_status(&self, calendar: &str, status: CustomStatus) -> CustomStatus {
        self.statuses.set(calendar, status).await
    }

    pub async fn clear_custom_status(&self, calendar: &str) -> CustomStatus {
        self.statuses.clear(calendar).await
    }
}
