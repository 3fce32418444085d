//! ICS parsing using the icalendar crate's parser.
//!
//! Produces one [`RawEvent`] per event instance overlapping a date range,
//! with recurring events expanded.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use icalendar::DatePerhapsTime;
use icalendar::parser::{Component, Property, read_calendar, unfold};
use tracing::warn;

use crate::date_range::DateRange;
use crate::error::{CalApiError, CalApiResult};
use crate::ics::recurrence;
use crate::ics::time::EventTime;

/// An event instance as read from the feed, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEvent {
    pub uid: Option<String>,
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// Whether DTSTART was a date rather than a date-time.
    pub date_only: bool,
    /// Every `X-` property, e.g. `X-MICROSOFT-CDO-BUSYSTATUS`.
    pub custom_attributes: HashMap<String, String>,
}

/// One VEVENT with its time values still unresolved.
struct VEvent {
    uid: Option<String>,
    summary: String,
    start: EventTime,
    end: Option<EventTime>,
    rrule: Option<String>,
    exdates: Vec<EventTime>,
    recurrence_id: Option<EventTime>,
    custom_attributes: HashMap<String, String>,
}

impl VEvent {
    fn from_component(vevent: &Component<'_>) -> Option<Self> {
        let start: EventTime = DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?)
            .ok()?
            .into();
        let end = vevent
            .find_prop("DTEND")
            .and_then(|p| DatePerhapsTime::try_from(p).ok())
            .map(EventTime::from);

        let exdates = vevent
            .properties
            .iter()
            .filter(|p| p.name == "EXDATE")
            .flat_map(parse_exdate_property)
            .collect();

        let custom_attributes = vevent
            .properties
            .iter()
            .filter(|p| p.name.as_ref().starts_with("X-"))
            .map(|p| (p.name.to_string(), p.val.to_string()))
            .collect();

        Some(VEvent {
            uid: vevent.find_prop("UID").map(|p| p.val.to_string()),
            summary: vevent
                .find_prop("SUMMARY")
                .map(|p| p.val.to_string())
                .unwrap_or_default(),
            start,
            end,
            rrule: vevent.find_prop("RRULE").map(|p| p.val.to_string()),
            exdates,
            recurrence_id: vevent
                .find_prop("RECURRENCE-ID")
                .and_then(|p| DatePerhapsTime::try_from(p).ok())
                .map(EventTime::from),
            custom_attributes,
        })
    }

    /// Missing DTEND: one day for all-day events, zero length otherwise.
    fn duration(&self) -> Duration {
        match &self.end {
            Some(end) => (end.to_utc() - self.start.to_utc()).max(Duration::zero()),
            None if self.start.is_date() => Duration::days(1),
            None => Duration::zero(),
        }
    }

    fn instance(&self, start: DateTime<Utc>) -> RawEvent {
        RawEvent {
            uid: self.uid.clone(),
            summary: self.summary.clone(),
            start,
            end: start + self.duration(),
            date_only: self.start.is_date(),
            custom_attributes: self.custom_attributes.clone(),
        }
    }
}

/// Parse `content` and return the event instances overlapping `range`,
/// in feed order.
pub fn parse_events(content: &str, range: &DateRange) -> CalApiResult<Vec<RawEvent>> {
    let unfolded = unfold(content);
    if !unfolded.contains("BEGIN:VCALENDAR") {
        return Err(CalApiError::IcsParse("missing BEGIN:VCALENDAR".into()));
    }

    let calendar = read_calendar(&unfolded).map_err(|e| CalApiError::IcsParse(e.to_string()))?;

    let mut vevents = Vec::new();
    collect_vevents(&calendar.components, &mut vevents);

    let vevents: Vec<VEvent> = vevents
        .into_iter()
        .filter_map(VEvent::from_component)
        .collect();

    // RECURRENCE-ID overrides replace the generated instance of their master
    let overridden: HashMap<&str, Vec<DateTime<Utc>>> =
        vevents
            .iter()
            .fold(HashMap::new(), |mut acc, vevent| {
                if let (Some(uid), Some(recurrence_id)) = (&vevent.uid, &vevent.recurrence_id) {
                    acc.entry(uid.as_str())
                        .or_insert_with(Vec::new)
                        .push(recurrence_id.to_utc());
                }
                acc
            });

    let mut events = Vec::new();
    for vevent in &vevents {
        match (&vevent.rrule, &vevent.recurrence_id) {
            (Some(rrule), None) => {
                let mut excluded: Vec<DateTime<Utc>> =
                    vevent.exdates.iter().map(EventTime::to_utc).collect();
                if let Some(ids) = vevent.uid.as_deref().and_then(|uid| overridden.get(uid)) {
                    excluded.extend(ids);
                }

                match recurrence::expand(&vevent.start, rrule, vevent.duration(), range, &excluded) {
                    Ok(starts) => events.extend(starts.into_iter().map(|s| vevent.instance(s))),
                    Err(e) => {
                        warn!(summary = %vevent.summary, error = %e, "Unable to expand recurring event, keeping first instance only");
                        push_if_overlapping(&mut events, vevent.instance(vevent.start.to_utc()), range);
                    }
                }
            }
            _ => push_if_overlapping(&mut events, vevent.instance(vevent.start.to_utc()), range),
        }
    }

    Ok(events)
}

fn push_if_overlapping(events: &mut Vec<RawEvent>, event: RawEvent, range: &DateRange) {
    if range.overlaps(event.start, event.end) {
        events.push(event);
    }
}

fn collect_vevents<'a>(components: &'a [Component<'a>], out: &mut Vec<&'a Component<'a>>) {
    for component in components {
        if component.name == "VEVENT" {
            out.push(component);
        } else {
            collect_vevents(&component.components, out);
        }
    }
}

/// Parse an EXDATE property, which may carry comma-separated values and a
/// TZID or VALUE=DATE parameter.
fn parse_exdate_property(prop: &Property<'_>) -> Vec<EventTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    prop.val
        .as_ref()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            if is_date {
                chrono::NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(EventTime::Date)
            } else if let Some(utc) = s.strip_suffix('Z') {
                chrono::NaiveDateTime::parse_from_str(utc, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeUtc(dt.and_utc()))
            } else {
                let naive = chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S").ok()?;
                Some(match &tzid {
                    Some(tz) => EventTime::DateTimeZoned {
                        datetime: naive,
                        tzid: tz.clone(),
                    },
                    None => EventTime::DateTimeFloating(naive),
                })
            }
        })
        .collect()
}
