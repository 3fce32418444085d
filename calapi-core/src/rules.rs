//! Declarative rules that filter and relabel events.
//!
//! Rules are evaluated in configured order; the first rule that matches an
//! event decides its fate (see [`apply_rules`]). An event that no rule matches
//! is dropped, so a config that wants to keep anything needs a catch-all rule:
//!
//! ```yaml
//! rules:
//!   - name: keep everything
//!     calendar: "*"
//!     key: "*"
//!     contains: ["*"]
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::event::Event;

const WILDCARD: &str = "*";

/// Which event field a rule compares against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum RuleKey {
    #[serde(rename = "title")]
    Title,
    #[serde(rename = "all_day")]
    AllDay,
    #[serde(rename = "busy")]
    Busy,
    /// Title, all-day flag and busy state concatenated.
    #[serde(rename = "*")]
    All,
    /// Missing or unknown key; compares against an empty field.
    #[default]
    #[serde(other)]
    Unset,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Rule {
    pub name: String,
    /// Calendar the rule applies to; "", "*" and "all" mean every calendar.
    #[serde(rename = "calendar")]
    pub calendar_name: String,
    pub key: RuleKey,
    /// Case-insensitive substrings; "*" matches anything.
    pub contains: Vec<String>,
    pub skip: bool,
    pub message: String,
    pub important: bool,
}

/// Outcome of evaluating one rule against one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Evaluation {
    pub matched: bool,
    pub skip: bool,
}

impl Evaluation {
    const NO_MATCH: Evaluation = Evaluation {
        matched: false,
        skip: false,
    };
}

impl Rule {
    /// A rule that keeps every event untouched.
    pub fn catch_all() -> Self {
        Rule {
            name: "catch-all".to_string(),
            calendar_name: WILDCARD.to_string(),
            key: RuleKey::All,
            contains: vec![WILDCARD.to_string()],
            ..Default::default()
        }
    }

    fn applies_to(&self, calendar_name: &str) -> bool {
        matches!(self.calendar_name.as_str(), "" | WILDCARD | "all")
            || self.calendar_name == calendar_name
    }

    fn field_value(&self, event: &Event) -> String {
        match self.key {
            RuleKey::Title => event.title.clone(),
            RuleKey::AllDay => event.all_day.to_string(),
            RuleKey::Busy => event.busy.to_string(),
            RuleKey::All => format!("{}{}{}", event.title, event.all_day, event.busy),
            RuleKey::Unset => String::new(),
        }
    }

    /// Evaluate the rule and, on a match, overwrite the event's message and
    /// important flag with the rule's.
    pub fn evaluate(&self, event: &mut Event) -> Evaluation {
        if !self.applies_to(&event.calendar_name) {
            return Evaluation::NO_MATCH;
        }

        let field = self.field_value(event);
        let haystack = field.to_lowercase();
        let Some(pattern) = self
            .contains
            .iter()
            .find(|pattern| *pattern == WILDCARD || haystack.contains(&pattern.to_lowercase()))
        else {
            return Evaluation::NO_MATCH;
        };

        if event.message != self.message {
            event.message = self.message.clone();
        }
        if event.important != self.important {
            event.important = self.important;
        }

        debug!(
            rule = %self.name,
            calendar = %self.calendar_name,
            title = %event.title,
            key = ?self.key,
            field = %field,
            contains = %pattern,
            skip = self.skip,
            relabel_important = event.important,
            relabel_message = %event.message,
            "Rule evaluated"
        );

        Evaluation {
            matched: true,
            skip: self.skip,
        }
    }
}

/// Run `rules` in order against `event`. Returns the (possibly relabeled)
/// event if the first matching rule keeps it, `None` if that rule skips it or
/// if no rule matches at all.
pub fn apply_rules(rules: &[Rule], mut event: Event) -> Option<Event> {
    for rule in rules {
        let evaluation = rule.evaluate(&mut event);
        if evaluation.matched {
            return (!evaluation.skip).then_some(event);
        }
    }
    None
}
