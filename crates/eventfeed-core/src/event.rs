//! Event types for the public event listing.
//!
//! This module provides the shapes the aggregator produces and the cache
//! persists:
//! - [`Event`]: a calendar entry, possibly recurring, with its resolved next occurrence
//! - [`Instance`]: one concrete scheduled occurrence of an event
//! - [`EventTime`]: a named sub-window such as "Early Service"
//!
//! Timestamps are kept as the ISO-8601 strings the upstream API returned so a
//! cached snapshot round-trips byte-for-byte. Use [`Event::starts_at_utc`] when an
//! instant is needed.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::time::parse_iso;

/// A named sub-window of an event or instance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventTime {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
}

impl EventTime {
    /// Creates an event time with the given id and no name or bounds.
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            ..Default::default()
        }
    }

    /// Builder method to set the display name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Builder method to set start and end.
    pub fn with_bounds(mut self, starts_at: Option<String>, ends_at: Option<String>) -> Self {
        self.starts_at = starts_at;
        self.ends_at = ends_at;
        self
    }
}

/// One concrete occurrence of an event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Instance {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub start_at: String,
    #[serde(default)]
    pub end_at: Option<String>,
    /// RRULE-like recurrence descriptor, preserved verbatim.
    #[serde(default)]
    pub recurrence: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_times: Option<Vec<EventTime>>,
}

impl Instance {
    /// Creates an instance starting at the given ISO timestamp.
    pub fn new(start_at: impl Into<String>) -> Self {
        Self {
            id: None,
            start_at: start_at.into(),
            end_at: None,
            recurrence: None,
            event_times: None,
        }
    }
}

/// A calendar entry as published on the public listing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub starts_at: Option<String>,
    #[serde(default)]
    pub ends_at: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Whether the upstream "visible in public calendar" flag was true.
    #[serde(default)]
    pub visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_times: Option<Vec<EventTime>>,
    /// Earliest known upcoming occurrence, independent of `starts_at`.
    #[serde(default)]
    pub next_instance_starts_at: Option<String>,
    /// Up to a handful of occurrences, ascending by start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instances: Option<Vec<Instance>>,
}

impl Event {
    /// Creates an event with the given id and title and nothing else set.
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            ..Default::default()
        }
    }

    /// Builder method to set the start timestamp.
    pub fn with_starts_at(mut self, starts_at: impl Into<String>) -> Self {
        self.starts_at = Some(starts_at.into());
        self
    }

    /// Builder method to set the end timestamp.
    pub fn with_ends_at(mut self, ends_at: impl Into<String>) -> Self {
        self.ends_at = Some(ends_at.into());
        self
    }

    /// Builder method to set the visibility flag.
    pub fn with_visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Returns the parsed start instant, if any.
    pub fn starts_at_utc(&self) -> Option<DateTime<Utc>> {
        self.starts_at.as_deref().and_then(parse_iso)
    }

    /// Returns true when the event starts at or after `now`.
    ///
    /// Events without a parsable start are never upcoming.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.starts_at_utc().is_some_and(|start| start >= now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn event_builder() {
        let event = Event::new("e1", "Sunday Gathering")
            .with_starts_at("2025-01-05T15:00:00Z")
            .with_ends_at("2025-01-05T16:30:00Z")
            .with_visible(true);

        assert_eq!(event.id, "e1");
        assert_eq!(event.title, "Sunday Gathering");
        assert!(event.visible);
        assert_eq!(
            event.starts_at_utc(),
            Some(Utc.with_ymd_and_hms(2025, 1, 5, 15, 0, 0).unwrap())
        );
    }

    #[test]
    fn upcoming_is_inclusive_of_now() {
        let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        assert!(Event::new("a", "").with_starts_at("2025-01-01T00:00:00Z").is_upcoming(now));
        assert!(!Event::new("b", "").with_starts_at("2024-12-31T23:59:59Z").is_upcoming(now));
        assert!(!Event::new("c", "").is_upcoming(now));
        assert!(!Event::new("d", "").with_starts_at("tbd").is_upcoming(now));
    }

    #[test]
    fn serializes_camel_case() {
        let mut event = Event::new("e1", "Potluck").with_starts_at("2025-02-01T18:00:00Z");
        event.next_instance_starts_at = Some("2025-02-01T18:00:00Z".into());
        event.instances = Some(vec![Instance {
            recurrence: Some("FREQ=WEEKLY".into()),
            ..Instance::new("2025-02-01T18:00:00Z")
        }]);

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["startsAt"], "2025-02-01T18:00:00Z");
        assert_eq!(json["nextInstanceStartsAt"], "2025-02-01T18:00:00Z");
        assert_eq!(json["instances"][0]["startAt"], "2025-02-01T18:00:00Z");
        assert_eq!(json["instances"][0]["recurrence"], "FREQ=WEEKLY");
        assert!(json["instances"][0]["endAt"].is_null());
        assert!(json.get("eventTimes").is_none());
    }

    #[test]
    fn deserializes_sparse_cached_event() {
        let event: Event =
            serde_json::from_str(r#"{"id":"cached1","title":"Cached Event"}"#).unwrap();
        assert_eq!(event.id, "cached1");
        assert_eq!(event.title, "Cached Event");
        assert!(event.starts_at.is_none());
        assert!(!event.visible);
        assert!(event.instances.is_none());
    }

    #[test]
    fn event_time_builder() {
        let et = EventTime::new("et1")
            .with_name("Early Service")
            .with_bounds(Some("2025-01-05T14:00:00Z".into()), None);
        assert_eq!(et.id.as_deref(), Some("et1"));
        assert_eq!(et.name.as_deref(), Some("Early Service"));
        assert!(et.ends_at.is_none());
    }
}
