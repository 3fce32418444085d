//! Event time values as they appear in ICS, and their resolution to instants.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use icalendar::{CalendarDateTime, DatePerhapsTime};
use tracing::debug;

use crate::date_range::local_to_utc;

/// Exchange and Outlook publish Windows zone names in TZID.
const WINDOWS_ZONES: &[(&str, &str)] = &[
    ("Romance Standard Time", "Europe/Brussels"),
    ("Pacific Standard Time", "US/Pacific"),
    ("W. Europe Standard Time", "Europe/Berlin"),
    ("E. Australia Standard Time", "Australia/Brisbane"),
    ("GMT Standard Time", "Europe/Dublin"),
    ("Eastern Standard Time", "US/Eastern"),
    ("Greenwich Standard Time", "Etc/GMT"),
    ("tzone://Microsoft/Utc", "UTC"),
    ("Central Europe Standard Time", "Europe/Berlin"),
    ("Central Standard Time", "US/Central"),
    ("Customized Time Zone", "UTC"),
    ("India Standard Time", "Asia/Calcutta"),
    ("AUS Eastern Standard Time", "Australia/Brisbane"),
    ("UTC", "UTC"),
    ("Israel Standard Time", "Israel"),
    ("Singapore Standard Time", "Singapore"),
];

/// Resolve a TZID to a time zone, trying IANA names first and then the
/// Windows zone table.
pub fn resolve_tzid(tzid: &str) -> Option<Tz> {
    let tzid = tzid.trim().trim_matches('"');

    tzid.parse::<Tz>().ok().or_else(|| {
        WINDOWS_ZONES
            .iter()
            .find(|(windows, _)| *windows == tzid)
            .and_then(|(_, iana)| iana.parse::<Tz>().ok())
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// All-day date (VALUE=DATE)
    Date(NaiveDate),
    DateTimeUtc(DateTime<Utc>),
    /// No zone; read in the local time zone
    DateTimeFloating(NaiveDateTime),
    DateTimeZoned {
        datetime: NaiveDateTime,
        tzid: String,
    },
}

impl From<DatePerhapsTime> for EventTime {
    fn from(dpt: DatePerhapsTime) -> Self {
        match dpt {
            DatePerhapsTime::Date(d) => EventTime::Date(d),
            DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
                CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
                CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
                CalendarDateTime::WithTimezone { date_time, tzid } => EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                },
            },
        }
    }
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// The absolute instant. Dates resolve to local midnight; zones that
    /// cannot be resolved fall back to local time.
    pub fn to_utc(&self) -> DateTime<Utc> {
        match self {
            EventTime::Date(d) => local_to_utc(&d.and_time(chrono::NaiveTime::MIN)),
            EventTime::DateTimeUtc(dt) => *dt,
            EventTime::DateTimeFloating(naive) => local_to_utc(naive),
            EventTime::DateTimeZoned { datetime, tzid } => match resolve_tzid(tzid) {
                Some(tz) => tz
                    .from_local_datetime(datetime)
                    .earliest()
                    .map(|dt| dt.with_timezone(&Utc))
                    .unwrap_or_else(|| datetime.and_utc()),
                None => {
                    debug!(tzid = %tzid, "Unknown time zone, reading as local time");
                    local_to_utc(datetime)
                }
            },
        }
    }

    /// DTSTART line for the rrule parser. Unresolvable zones and dates are
    /// written as floating times, which the parser reads as local.
    pub fn to_rrule_dtstart(&self) -> String {
        const FORMAT: &str = "%Y%m%dT%H%M%S";
        match self {
            EventTime::Date(d) => format!("DTSTART:{}T000000", d.format("%Y%m%d")),
            EventTime::DateTimeUtc(dt) => format!("DTSTART:{}Z", dt.format(FORMAT)),
            EventTime::DateTimeFloating(dt) => format!("DTSTART:{}", dt.format(FORMAT)),
            EventTime::DateTimeZoned { datetime, tzid } => match resolve_tzid(tzid) {
                Some(tz) => format!("DTSTART;TZID={}:{}", tz.name(), datetime.format(FORMAT)),
                None => format!("DTSTART:{}", datetime.format(FORMAT)),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_iana_and_windows_names() {
        assert_eq!(resolve_tzid("Europe/Berlin"), Some(chrono_tz::Europe::Berlin));
        assert_eq!(
            resolve_tzid("W. Europe Standard Time"),
            Some(chrono_tz::Europe::Berlin)
        );
        assert_eq!(resolve_tzid("\"Pacific Standard Time\""), Some(chrono_tz::US::Pacific));
        assert_eq!(resolve_tzid("Mars Standard Time"), None);
    }

    #[test]
    fn zoned_time_converts_to_instant() {
        let datetime = NaiveDate::from_ymd_opt(2025, 3, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let zoned = EventTime::DateTimeZoned {
            datetime,
            tzid: "W. Europe Standard Time".to_string(),
        };

        // CET is UTC+1 in March before the DST switch
        assert_eq!(
            zoned.to_utc(),
            Utc.with_ymd_and_hms(2025, 3, 20, 8, 0, 0).unwrap()
        );
    }

    #[test]
    fn rrule_dtstart_uses_iana_name() {
        let datetime = NaiveDate::from_ymd_opt(2025, 3, 20)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        let zoned = EventTime::DateTimeZoned {
            datetime,
            tzid: "W. Europe Standard Time".to_string(),
        };
        assert_eq!(
            zoned.to_rrule_dtstart(),
            "DTSTART;TZID=Europe/Berlin:20250320T090000"
        );
    }
}
