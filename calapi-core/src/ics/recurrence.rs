//! RRULE expansion for recurring events.
//!
//! Expands a master recurring event into the instances that overlap a date
//! range, skipping EXDATEs and instances replaced by a RECURRENCE-ID override.

use chrono::{DateTime, Duration, Utc};
use rrule::RRuleSet;

use crate::date_range::DateRange;
use crate::error::{CalApiError, CalApiResult};
use crate::ics::time::EventTime;

/// Upper bound on generated instances per master and day.
const MAX_OCCURRENCES: u16 = 1500;

/// Start instants of the occurrences of `rrule` (anchored at `start`, lasting
/// `duration`) that overlap `range`, minus `excluded` instants.
pub fn expand(
    start: &EventTime,
    rrule: &str,
    duration: Duration,
    range: &DateRange,
    excluded: &[DateTime<Utc>],
) -> CalApiResult<Vec<DateTime<Utc>>> {
    let rrule_str = format!("{}\nRRULE:{}", start.to_rrule_dtstart(), rrule);

    let rrule_set: RRuleSet = rrule_str
        .parse()
        .map_err(|e| CalApiError::Recurrence(format!("Failed to parse RRULE '{rrule}': {e}")))?;

    // after/before are exclusive, widen by one second. Occurrences that started
    // before the range but are still running are included through `duration`.
    let tz: rrule::Tz = Utc.into();
    let after = (range.from - duration - Duration::seconds(1)).with_timezone(&tz);
    let before = (range.to + Duration::seconds(1)).with_timezone(&tz);

    let result = rrule_set.after(after).before(before).all(MAX_OCCURRENCES);

    Ok(result
        .dates
        .iter()
        .map(|dt| dt.with_timezone(&Utc))
        .filter(|occurrence| range.overlaps(*occurrence, *occurrence + duration))
        .filter(|occurrence| !excluded.contains(occurrence))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeZone};

    fn day(d: u32) -> DateRange {
        DateRange {
            from: Utc.with_ymd_and_hms(2025, 3, d, 0, 0, 0).unwrap(),
            to: Utc.with_ymd_and_hms(2025, 3, d, 23, 59, 59).unwrap(),
        }
    }

    fn start() -> EventTime {
        EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 3, 3, 9, 0, 0).unwrap())
    }

    #[test]
    fn daily_rule_yields_one_instance_per_day() {
        let occurrences = expand(&start(), "FREQ=DAILY", Duration::hours(1), &day(20), &[]).unwrap();
        assert_eq!(
            occurrences,
            vec![Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()]
        );
    }

    #[test]
    fn weekly_rule_skips_other_days() {
        // 2025-03-03 is a Monday, 2025-03-20 a Thursday
        let occurrences =
            expand(&start(), "FREQ=WEEKLY;BYDAY=MO", Duration::hours(1), &day(20), &[]).unwrap();
        assert!(occurrences.is_empty());

        let monday =
            expand(&start(), "FREQ=WEEKLY;BYDAY=MO", Duration::hours(1), &day(17), &[]).unwrap();
        assert_eq!(monday.len(), 1);
    }

    #[test]
    fn excluded_instances_are_dropped() {
        let excluded = [Utc.with_ymd_and_hms(2025, 3, 20, 9, 0, 0).unwrap()];
        let occurrences =
            expand(&start(), "FREQ=DAILY", Duration::hours(1), &day(20), &excluded).unwrap();
        assert!(occurrences.is_empty());
    }

    #[test]
    fn all_day_rule_expands_from_date() {
        let date = EventTime::Date(NaiveDate::from_ymd_opt(2025, 3, 3).unwrap());
        let range = DateRange::for_day(NaiveDate::from_ymd_opt(2025, 3, 20).unwrap());
        let occurrences = expand(&date, "FREQ=DAILY", Duration::days(1), &range, &[]).unwrap();
        assert_eq!(occurrences, vec![range.from]);
    }

    #[test]
    fn invalid_rule_is_an_error() {
        let err = expand(&start(), "FREQ=SOMETIMES", Duration::hours(1), &day(20), &[]);
        assert!(matches!(err, Err(CalApiError::Recurrence(_))));
    }
}
