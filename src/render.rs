//! Terminal rendering for API responses.
//!
//! Adds colored text output to calapi-core types using owo_colors.

use chrono::{DateTime, Local, Utc};
use owo_colors::OwoColorize;

use calapi_core::{BusyState, CalendarResponse, CustomStatus, Event};

/// Extension trait for terminal rendering with colors.
pub trait Render {
    fn render(&self, now: DateTime<Utc>) -> String;
}

/// "3:04PM" in local time
fn kitchen(instant: DateTime<Utc>) -> String {
    instant.with_timezone(&Local).format("%-I:%M%p").to_string()
}

/// One numbered line per event. Past events are struck through.
fn render_entry(idx: usize, event: &Event, now: DateTime<Utc>, show_calendar: bool) -> String {
    let mut line = format!("{:2}) ", idx);

    if matches!(
        event.busy,
        BusyState::Tentative | BusyState::OutOfOffice | BusyState::WorkingElsewhere
    ) {
        line.push_str(&format!("[{}]", event.busy));
    }

    if event.all_day {
        line.push_str(&format!("{} (all day)", event.title));
    } else {
        line.push_str(&format!(
            "{}: <{} - {}>",
            event.title,
            kitchen(event.start),
            kitchen(event.end)
        ));
    }

    if !event.message.is_empty() {
        line.push_str(&format!(" - {}", event.message));
    }

    let calendar = format!(" ({})", event.calendar_name);

    if event.end < now {
        return format!(
            "{}{}",
            line.strikethrough().bright_black(),
            calendar.strikethrough().bright_black().italic()
        );
    }

    let line = match event.busy {
        _ if event.important => line.red().bold().to_string(),
        BusyState::Free => line.dimmed().to_string(),
        BusyState::Tentative => line.truecolor(255, 165, 0).italic().to_string(),
        BusyState::OutOfOffice | BusyState::WorkingElsewhere => line.magenta().bold().to_string(),
        BusyState::Busy => line,
    };

    if show_calendar {
        format!("{}{}", line, calendar.dimmed().italic())
    } else {
        line
    }
}

impl Render for CalendarResponse {
    fn render(&self, now: DateTime<Utc>) -> String {
        let refreshed = self.last_updated.with_timezone(&Local);
        let mut lines = vec![
            format!("(last refreshed: {})", refreshed.format("%H:%M:%S"))
                .dimmed()
                .italic()
                .to_string(),
            String::new(),
            format!(
                "Calendar: {} Date: {}",
                self.calendar_name.bold().underline(),
                refreshed.format("%Y-%m-%d").bold().underline()
            ),
        ];

        let show_calendar = self
            .entries
            .iter()
            .any(|e| e.calendar_name != self.calendar_name);

        // All-day events first, then timed events in their existing order
        let all_day = self.entries.iter().filter(|e| e.all_day);
        let timed = self.entries.iter().filter(|e| !e.all_day);

        for (idx, event) in all_day.chain(timed).enumerate() {
            lines.push(render_entry(idx + 1, event, now, show_calendar));
        }

        lines.join("\n")
    }
}

impl Render for Option<Event> {
    fn render(&self, now: DateTime<Utc>) -> String {
        match self {
            Some(event) => render_entry(1, event, now, true),
            None => "No event right now".dimmed().to_string(),
        }
    }
}

impl Render for CustomStatus {
    fn render(&self, _now: DateTime<Utc>) -> String {
        if !self.is_set() {
            return "No custom status set".dimmed().to_string();
        }

        let mut line = self.title.bold().to_string();
        if !self.description.is_empty() {
            line.push_str(&format!(" - {}", self.description));
        }
        if !self.icon.is_empty() {
            line.push_str(&format!(
                " {}",
                format!("({}, {}px)", self.icon, self.icon_size).dimmed()
            ));
        }
        line
    }
}
