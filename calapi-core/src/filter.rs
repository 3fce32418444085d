//! Calendar selection used by readers of the cache.

use std::fmt;

const ALL: &str = "all";

/// Either every calendar or a single calendar by name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarFilter {
    All,
    Named(String),
}

impl CalendarFilter {
    /// "", "*" and "all" select every calendar.
    pub fn parse(name: &str) -> Self {
        match name {
            "" | "*" | ALL => CalendarFilter::All,
            other => CalendarFilter::Named(other.to_string()),
        }
    }

    pub fn matches(&self, calendar_name: &str) -> bool {
        match self {
            CalendarFilter::All => true,
            CalendarFilter::Named(name) => name == calendar_name,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            CalendarFilter::All => ALL,
            CalendarFilter::Named(name) => name,
        }
    }
}

impl fmt::Display for CalendarFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
