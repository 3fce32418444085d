//! ICS parsing.
//!
//! Reads raw feed bytes into event instances for a single day, resolving
//! time zones (including Windows zone names) and expanding recurrences.

mod parse;
mod recurrence;
mod time;

pub use parse::{RawEvent, parse_events};
pub use time::{EventTime, resolve_tzid};
