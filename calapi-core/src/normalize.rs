//! Conversion of raw feed records into canonical [`Event`]s.

use crate::event::{BusyState, Event};
use crate::ics::RawEvent;

const BUSY_STATUS_ATTR: &str = "X-MICROSOFT-CDO-BUSYSTATUS";
const ALL_DAY_ATTR: &str = "X-MICROSOFT-CDO-ALLDAYEVENT";

/// Title markers Exchange prepends to cancelled and declined meetings.
const DISCARD_MARKERS: [&str; 2] = ["Canceled", "Declined"];

/// Build the canonical event for `calendar_name`, or `None` if the record is
/// a cancelled or declined meeting.
pub fn normalize(calendar_name: &str, raw: &RawEvent) -> Option<Event> {
    if DISCARD_MARKERS
        .iter()
        .any(|marker| raw.summary.contains(marker))
    {
        return None;
    }

    let busy = raw
        .custom_attributes
        .get(BUSY_STATUS_ATTR)
        .map(|value| BusyState::from_vendor(value))
        .unwrap_or_default();

    let all_day = raw
        .custom_attributes
        .get(ALL_DAY_ATTR)
        .is_some_and(|value| value == "TRUE");

    Some(Event {
        title: raw.summary.clone(),
        start: raw.start,
        end: raw.end.max(raw.start),
        all_day,
        busy,
        calendar_name: calendar_name.to_string(),
        message: String::new(),
        important: false,
    })
}
