//! Calendar source entries from the `calendars` config section.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a calendar's iCal data comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    File,
    Url,
    /// Kept so one misconfigured entry fails alone at fetch time.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::File => f.write_str("file"),
            SourceKind::Url => f.write_str("url"),
            SourceKind::Other(other) => f.write_str(other),
        }
    }
}

/// One configured calendar feed.
///
/// ```yaml
/// calendars:
///   - name: room-a
///     from: url
///     ical: https://example.com/room-a.ics
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarSource {
    pub name: String,
    #[serde(rename = "from")]
    pub kind: SourceKind,
    #[serde(rename = "ical")]
    pub location: String,
}

impl CalendarSource {
    pub fn file(name: impl Into<String>, path: impl Into<String>) -> Self {
        CalendarSource {
            name: name.into(),
            kind: SourceKind::File,
            location: path.into(),
        }
    }

    pub fn url(name: impl Into<String>, url: impl Into<String>) -> Self {
        CalendarSource {
            name: name.into(),
            kind: SourceKind::Url,
            location: url.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_kind_is_preserved() {
        let source: CalendarSource =
            serde_json::from_str(r#"{"name":"x","from":"ftp","ical":"ftp://host/x.ics"}"#)
                .unwrap();
        assert_eq!(source.kind, SourceKind::Other("ftp".to_string()));
        assert_eq!(source.kind.to_string(), "ftp");
    }

    #[test]
    fn known_kinds_parse() {
        let source: CalendarSource =
            serde_json::from_str(r#"{"name":"x","from":"url","ical":"https://host/x.ics"}"#)
                .unwrap();
        assert_eq!(source.kind, SourceKind::Url);
    }
}
