//! Picks the event happening right now.

use chrono::{DateTime, TimeDelta, Utc};

use crate::event::{Event, Snapshot};
use crate::filter::CalendarFilter;

/// The event of `filter`'s calendars that is ongoing at `now`.
///
/// When events overlap, the one that started most recently wins. On equal
/// start times an important event beats a non-important one; otherwise the
/// first one seen is kept.
pub fn current_event<'a>(
    snapshot: &'a Snapshot,
    filter: &CalendarFilter,
    now: DateTime<Utc>,
) -> Option<&'a Event> {
    let mut closest: Option<&Event> = None;
    let mut closest_delta = TimeDelta::MAX;

    let candidates = snapshot
        .entries
        .iter()
        .filter(|event| filter.matches(&event.calendar_name))
        .filter(|event| event.is_ongoing_at(now));

    for event in candidates {
        let delta = now - event.start;

        if delta == closest_delta
            && event.important
            && closest.is_none_or(|best| !best.important)
        {
            closest = Some(event);
        } else if delta < closest_delta {
            closest = Some(event);
            closest_delta = delta;
        }
    }

    closest
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::BusyState;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 20, 12, 0, 0).unwrap()
    }

    fn event(title: &str, calendar: &str, started_secs_ago: i64, important: bool) -> Event {
        Event {
            title: title.to_string(),
            start: now() - Duration::seconds(started_secs_ago),
            end: now() + Duration::hours(1),
            all_day: false,
            busy: BusyState::Busy,
            calendar_name: calendar.to_string(),
            message: String::new(),
            important,
        }
    }

    fn snapshot(entries: Vec<Event>) -> Snapshot {
        Snapshot {
            generation: 1,
            last_updated: now(),
            entries,
        }
    }

    fn resolve(entries: Vec<Event>, filter: &str) -> Option<String> {
        let snapshot = snapshot(entries);
        current_event(&snapshot, &CalendarFilter::parse(filter), now()).map(|e| e.title.clone())
    }

    #[test]
    fn nothing_ongoing() {
        let mut past = event("Past", "room-a", 7200, false);
        past.end = now() - Duration::hours(1);
        let mut ends_now = event("Ends now", "room-a", 600, false);
        ends_now.end = now();
        let mut starts_now = event("Starts now", "room-a", 0, false);
        starts_now.start = now();

        assert_eq!(resolve(vec![past, ends_now, starts_now], "all"), None);
        assert_eq!(resolve(vec![], "all"), None);
    }

    #[test]
    fn single_match_is_returned() {
        assert_eq!(
            resolve(vec![event("Standup", "room-a", 60, false)], "all"),
            Some("Standup".to_string())
        );
    }

    #[test]
    fn equal_delta_prefers_important_in_any_order() {
        let plain = event("Plain", "room-a", 5, false);
        let important = event("Important", "room-a", 5, true);

        assert_eq!(
            resolve(vec![plain.clone(), important.clone()], "all"),
            Some("Important".to_string())
        );
        assert_eq!(
            resolve(vec![important, plain], "all"),
            Some("Important".to_string())
        );
    }

    #[test]
    fn smaller_delta_beats_importance() {
        let important = event("Important", "room-a", 5, true);
        let recent = event("Recent", "room-a", 3, false);

        assert_eq!(
            resolve(vec![important.clone(), recent.clone()], "all"),
            Some("Recent".to_string())
        );
        assert_eq!(
            resolve(vec![recent, important], "all"),
            Some("Recent".to_string())
        );
    }

    #[test]
    fn equal_delta_same_importance_keeps_first_seen() {
        let a = event("A", "room-a", 5, false);
        let b = event("B", "room-a", 5, false);
        assert_eq!(resolve(vec![a.clone(), b.clone()], "all"), Some("A".to_string()));

        let a = Event { important: true, ..a };
        let b = Event { important: true, ..b };
        assert_eq!(resolve(vec![a, b], "all"), Some("A".to_string()));
    }

    #[test]
    fn calendar_filter_applies() {
        let entries = vec![
            event("Room A", "room-a", 5, false),
            event("Room B", "room-b", 60, false),
        ];
        assert_eq!(resolve(entries.clone(), "room-b"), Some("Room B".to_string()));
        assert_eq!(resolve(entries.clone(), "room-c"), None);
        assert_eq!(resolve(entries, "*"), Some("Room A".to_string()));
    }
}
