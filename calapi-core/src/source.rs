//! Fetching a calendar source and running its per-source pipeline:
//! fetch, parse today's window, sort, normalize, apply rules.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::config::{CalendarSource, SourceKind};
use crate::date_range::DateRange;
use crate::error::{CalApiError, CalApiResult};
use crate::event::Event;
use crate::ics::parse_events;
use crate::normalize::normalize;
use crate::rules::{Rule, apply_rules};

/// Retrieves raw iCal text from files and URLs.
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    http: reqwest::Client,
}

impl SourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fetch(&self, source: &CalendarSource) -> CalApiResult<String> {
        match &source.kind {
            SourceKind::File => self.fetch_file(&source.location).await,
            SourceKind::Url => self.fetch_url(&source.location).await,
            SourceKind::Other(kind) => Err(CalApiError::UnsupportedSource(kind.clone())),
        }
    }

    async fn fetch_file(&self, path: &str) -> CalApiResult<String> {
        let path = shellexpand::tilde(path).into_owned();
        let bytes = tokio::fs::read(&path).await?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn fetch_url(&self, url: &str) -> CalApiResult<String> {
        let http_error = |e: reqwest::Error| CalApiError::Http {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self.http.get(url).send().await.map_err(http_error)?;
        let response = response.error_for_status().map_err(http_error)?;
        response.text().await.map_err(http_error)
    }
}

/// Load the events of `source` overlapping `range`, filtered by `rules`.
///
/// The fetch is abandoned when `cancel` fires or after `timeout`, whichever
/// comes first; either way only this source fails.
pub async fn load_events(
    fetcher: &SourceFetcher,
    source: &CalendarSource,
    rules: &[Rule],
    range: &DateRange,
    timeout: Duration,
    cancel: &CancellationToken,
) -> CalApiResult<Vec<Event>> {
    let content = tokio::select! {
        biased;
        _ = cancel.cancelled() => return Err(CalApiError::Cancelled),
        fetched = tokio::time::timeout(timeout, fetcher.fetch(source)) => {
            fetched.map_err(|_| CalApiError::Timeout(timeout))??
        }
    };

    let mut raw_events = parse_events(&content, range)?;
    raw_events.sort_by_key(|raw| raw.start);

    let total = raw_events.len();
    let events: Vec<Event> = raw_events
        .iter()
        .filter_map(|raw| normalize(&source.name, raw))
        .filter_map(|event| apply_rules(rules, event))
        .collect();

    debug!(
        calendar = %source.name,
        parsed = total,
        kept = events.len(),
        "Applied rules to calendar"
    );

    Ok(events)
}
