//! Canonical event types.
//!
//! Raw calendar records are normalized into [`Event`]s, merged across sources
//! into a [`Snapshot`], and served to API readers. Instants are serialized as
//! Unix seconds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Availability of the calendar owner during an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BusyState {
    #[default]
    Free,
    Busy,
    Tentative,
    OutOfOffice,
    WorkingElsewhere,
}

impl BusyState {
    /// Map the Exchange `X-MICROSOFT-CDO-BUSYSTATUS` value. Unknown values are free.
    pub fn from_vendor(value: &str) -> Self {
        match value {
            "BUSY" => BusyState::Busy,
            "TENTATIVE" => BusyState::Tentative,
            "OOF" => BusyState::OutOfOffice,
            "WORKINGELSEWHERE" => BusyState::WorkingElsewhere,
            _ => BusyState::Free,
        }
    }
}

impl fmt::Display for BusyState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BusyState::Free => "Free",
            BusyState::Busy => "Busy",
            BusyState::Tentative => "Tentative",
            BusyState::OutOfOffice => "OutOfOffice",
            BusyState::WorkingElsewhere => "WorkingElsewhere",
        };
        f.write_str(name)
    }
}

/// A single event of today, owned by one calendar source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub title: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end: DateTime<Utc>,
    pub all_day: bool,
    pub busy: BusyState,
    pub calendar_name: String,

    // Relabeling applied by the first matching rule
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub important: bool,
}

impl Event {
    /// True when `now` lies strictly inside `(start, end)`.
    pub fn is_ongoing_at(&self, now: DateTime<Utc>) -> bool {
        self.start < now && now < self.end
    }
}

/// The cache's published state. Immutable once published.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Incremented on every publish; 0 is the empty snapshot created at construction.
    pub generation: u64,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub last_updated: DateTime<Utc>,
    pub entries: Vec<Event>,
}

impl Snapshot {
    pub fn empty() -> Self {
        Snapshot {
            generation: 0,
            last_updated: Utc::now(),
            entries: Vec::new(),
        }
    }
}

/// Status message a user pinned to a calendar, e.g. "Do not disturb".
///
/// The zero value means "no status set".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomStatus {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub icon: String,
    #[serde(default)]
    pub icon_size: i32,
}

impl CustomStatus {
    pub fn is_set(&self) -> bool {
        !self.title.is_empty()
    }
}
