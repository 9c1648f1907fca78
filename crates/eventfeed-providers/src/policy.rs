//! Publication policy applied to raw event records.
//!
//! A record is publishable when the upstream visibility flag is literally
//! `true` and none of its text fields mentions a forbidden keyword as a whole
//! word, case-insensitively.

use regex::Regex;
use serde_json::Value;
use tracing::{debug, warn};

use crate::normalize::VISIBILITY_ATTRIBUTE;

/// Keywords that keep an event off the public listing.
pub const DEFAULT_FORBIDDEN_KEYWORDS: &[&str] = &[
    "election",
    "elections",
    "rehearsal",
    "rehearsals",
    "vertical",
];

/// Attributes whose text is scanned for forbidden keywords.
const KEYWORD_ATTRIBUTES: &[&str] = &["name", "title", "summary", "description", "notes", "category"];

#[derive(Debug, Clone)]
pub struct ContentPolicy {
    keywords: Vec<String>,
    pattern: Option<Regex>,
}

impl Default for ContentPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_FORBIDDEN_KEYWORDS.iter().copied())
    }
}

impl ContentPolicy {
    /// Creates a policy forbidding the given keywords. Empty entries are
    /// ignored; an empty list forbids nothing.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let keywords: Vec<String> = keywords
            .into_iter()
            .map(|k| k.as_ref().trim().to_string())
            .filter(|k| !k.is_empty())
            .collect();

        let pattern = if keywords.is_empty() {
            None
        } else {
            let alternation = keywords
                .iter()
                .map(|k| regex::escape(k))
                .collect::<Vec<_>>()
                .join("|");
            match Regex::new(&format!(r"(?i)\b(?:{})\b", alternation)) {
                Ok(re) => Some(re),
                Err(err) => {
                    warn!(error = %err, "invalid keyword pattern, keyword filter disabled");
                    None
                }
            }
        };

        Self { keywords, pattern }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    /// True when the record's visibility attribute is the boolean `true`.
    pub fn is_visible(record: &Value) -> bool {
        record
            .get("attributes")
            .and_then(|attrs| attrs.get(VISIBILITY_ATTRIBUTE))
            == Some(&Value::Bool(true))
    }

    /// True when any scanned attribute contains a forbidden keyword.
    ///
    /// A record whose attributes are not an object is treated as clean.
    pub fn has_forbidden_keyword(&self, record: &Value) -> bool {
        let Some(pattern) = &self.pattern else {
            return false;
        };
        let Some(attrs) = record.get("attributes").and_then(Value::as_object) else {
            debug!("record attributes are not an object, skipping keyword check");
            return false;
        };

        let text = KEYWORD_ATTRIBUTES
            .iter()
            .filter_map(|name| match attrs.get(*name)? {
                Value::String(s) => Some(s.clone()),
                Value::Number(n) => Some(n.to_string()),
                Value::Bool(b) => Some(b.to_string()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join(" ");

        pattern.is_match(&text)
    }

    pub fn is_publishable(&self, record: &Value) -> bool {
        Self::is_visible(record) && !self.has_forbidden_keyword(record)
    }

    /// Keeps publishable records, preserving order.
    pub fn retain_publishable(&self, records: Vec<Value>) -> Vec<Value> {
        let before = records.len();
        let kept: Vec<Value> = records
            .into_iter()
            .filter(|record| self.is_publishable(record))
            .collect();
        debug!(before, after = kept.len(), "applied content policy");
        kept
    }
}
