//! Date range for filtering events.

use chrono::{DateTime, Local, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};

/// Closed range `[from, to]` of instants. Sources are parsed against the range
/// covering the current local day.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: DateTime<Utc>,
    pub to: DateTime<Utc>,
}

impl DateRange {
    /// `[00:00:00, 23:59:59]` of `date` in the local time zone.
    pub fn for_day(date: NaiveDate) -> Self {
        let midnight = NaiveTime::MIN;
        let last_second = NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN);

        DateRange {
            from: local_to_utc(&date.and_time(midnight)),
            to: local_to_utc(&date.and_time(last_second)),
        }
    }

    /// The current local calendar day.
    pub fn today() -> Self {
        Self::for_day(Local::now().date_naive())
    }

    /// True when an event spanning `[start, end]` touches the range. An event
    /// ending exactly at `from` (e.g. yesterday's all-day event) does not.
    pub fn overlaps(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.to && (end > self.from || (start == end && start >= self.from))
    }
}

/// Interpret a wall-clock time in the local zone. Times skipped by a DST
/// transition are read as UTC.
pub fn local_to_utc(naive: &NaiveDateTime) -> DateTime<Utc> {
    Local
        .from_local_datetime(naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| naive.and_utc())
}
