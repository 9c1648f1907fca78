//! Raw record to [`Event`] / [`Occurrence`] conversion.
//!
//! Upstream attribute names drift between API versions, so every output
//! field is read from an ordered list of candidate [`Field`]s and the first
//! one holding a string wins.
//!
//! The normalization process:
//! 1. Index side-loaded `EventTime` resources by id
//! 2. Map each primary record's attributes onto the output shape
//! 3. Resolve `event_times` relationships against the index

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use eventfeed_core::{Event, EventTime, Instance, parse_iso};
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::{ProviderError, ProviderResult};
use crate::raw_event::{EVENT_TIME_TYPE, Field, RawRecord, ResourceRef, first_present};

pub const TITLE_FIELDS: &[Field] = &[Field::Attribute("name"), Field::Attribute("title")];
pub const EVENT_START_FIELDS: &[Field] =
    &[Field::Attribute("starts_at"), Field::Attribute("start_at")];
pub const EVENT_END_FIELDS: &[Field] = &[Field::Attribute("ends_at"), Field::Attribute("end_at")];
pub const LOCATION_FIELDS: &[Field] =
    &[Field::Attribute("location_name"), Field::Attribute("location")];
pub const LINK_FIELDS: &[Field] = &[Field::Link("html"), Field::Attribute("registration_url")];
pub const IMAGE_FIELDS: &[Field] = &[Field::Attribute("image_url"), Field::Attribute("image")];
pub const DESCRIPTION_FIELDS: &[Field] =
    &[Field::Attribute("summary"), Field::Attribute("description")];

pub const INSTANCE_START_FIELDS: &[Field] =
    &[Field::Attribute("start_at"), Field::Attribute("starts_at")];
pub const INSTANCE_END_FIELDS: &[Field] = &[Field::Attribute("end_at"), Field::Attribute("ends_at")];
pub const RECURRENCE_FIELDS: &[Field] = &[
    Field::Attribute("rrule"),
    Field::Attribute("recurrence"),
    Field::Attribute("recurrence_rule"),
];

/// Upstream attribute carrying the public-calendar visibility flag.
pub const VISIBILITY_ATTRIBUTE: &str = "visible_in_church_center";

/// Side-loaded event times of one response, keyed by id.
#[derive(Debug, Clone, Default)]
pub struct EventTimeIndex {
    by_id: HashMap<String, EventTime>,
}

impl EventTimeIndex {
    /// Builds the index from a document's `included` array.
    ///
    /// Resources of any other type, and malformed ones, are ignored.
    pub fn from_included(included: &[Value]) -> Self {
        let mut by_id = HashMap::new();
        for item in included {
            let record = match RawRecord::from_value(item) {
                Ok(record) => record,
                Err(err) => {
                    debug!(error = %err, "skipping malformed included resource");
                    continue;
                }
            };
            if record.kind.as_deref() != Some(EVENT_TIME_TYPE) {
                continue;
            }
            let Some(id) = record.id.clone() else {
                continue;
            };
            let time = EventTime {
                id: Some(id.clone()),
                name: record.attr("name").map(str::to_string),
                starts_at: record.attr("starts_at").map(str::to_string),
                ends_at: record.attr("ends_at").map(str::to_string),
            };
            by_id.insert(id, time);
        }
        Self { by_id }
    }

    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Resolves references in order; unknown ids are skipped.
    ///
    /// Returns `None` when nothing resolved.
    pub fn resolve(&self, refs: &[ResourceRef]) -> Option<Vec<EventTime>> {
        let resolved: Vec<EventTime> = refs
            .iter()
            .filter_map(|r| self.by_id.get(&r.id).cloned())
            .collect();
        if resolved.is_empty() {
            None
        } else {
            Some(resolved)
        }
    }
}

/// Converts one primary event record.
///
/// # Errors
///
/// Returns [`InvalidResponse`] if the record does not deserialize or has no
/// id.
///
/// [`InvalidResponse`]: crate::error::ProviderErrorCode::InvalidResponse
pub fn normalize_event(raw: &Value, index: &EventTimeIndex) -> ProviderResult<Event> {
    let record = RawRecord::from_value(raw)?;
    let id = record
        .id
        .clone()
        .ok_or_else(|| ProviderError::invalid_response("event record has no id"))?;

    let owned = |fields: &[Field]| first_present(&record, fields).map(str::to_string);

    Ok(Event {
        id,
        title: owned(TITLE_FIELDS).unwrap_or_default(),
        starts_at: owned(EVENT_START_FIELDS),
        ends_at: owned(EVENT_END_FIELDS),
        location: owned(LOCATION_FIELDS),
        link: owned(LINK_FIELDS),
        image: owned(IMAGE_FIELDS),
        description: owned(DESCRIPTION_FIELDS),
        visible: record.attributes.get(VISIBILITY_ATTRIBUTE) == Some(&Value::Bool(true)),
        event_times: index.resolve(record.event_time_refs()),
        next_instance_starts_at: None,
        instances: None,
    })
}

/// Converts a batch of event records, skipping the ones that fail.
pub fn normalize_events(raw: &[Value], index: &EventTimeIndex) -> Vec<Event> {
    raw.iter()
        .filter_map(|value| match normalize_event(value, index) {
            Ok(event) => Some(event),
            Err(err) => {
                warn!(error = %err, "skipping event record");
                None
            }
        })
        .collect()
}

/// A scheduled occurrence with its start already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Occurrence {
    pub id: Option<String>,
    /// Parent event id from the `event` relationship.
    pub event_id: Option<String>,
    /// Start as returned upstream.
    pub start_at: String,
    pub start: DateTime<Utc>,
    pub end_at: Option<String>,
    pub recurrence: Option<String>,
    pub event_times: Option<Vec<EventTime>>,
}

impl From<Occurrence> for Instance {
    fn from(occurrence: Occurrence) -> Self {
        Instance {
            id: occurrence.id,
            start_at: occurrence.start_at,
            end_at: occurrence.end_at,
            recurrence: occurrence.recurrence,
            event_times: occurrence.event_times,
        }
    }
}

/// Converts one instance record.
///
/// Returns `None` for malformed records and for records whose start is
/// missing or unparsable.
pub fn normalize_instance(raw: &Value, index: &EventTimeIndex) -> Option<Occurrence> {
    let record = match RawRecord::from_value(raw) {
        Ok(record) => record,
        Err(err) => {
            debug!(error = %err, "skipping instance record");
            return None;
        }
    };

    let start_at = first_present(&record, INSTANCE_START_FIELDS)?;
    let Some(start) = parse_iso(start_at) else {
        debug!(start_at, "skipping instance with unparsable start");
        return None;
    };

    Some(Occurrence {
        id: record.id.clone(),
        event_id: record.parent_event_id().map(str::to_string),
        start_at: start_at.to_string(),
        start,
        end_at: first_present(&record, INSTANCE_END_FIELDS).map(str::to_string),
        recurrence: first_present(&record, RECURRENCE_FIELDS).map(str::to_string),
        event_times: index.resolve(record.event_time_refs()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn included_times() -> Vec<Value> {
        vec![
            json!({
                "type": "EventTime", "id": "t1",
                "attributes": {
                    "name": "Early Service",
                    "starts_at": "2025-03-02T14:00:00Z",
                    "ends_at": "2025-03-02T15:00:00Z"
                }
            }),
            json!({ "type": "Campus", "id": "c1", "attributes": { "name": "North" } }),
        ]
    }

    mod events {
        use super::*;

        #[test]
        fn maps_primary_fields() {
            let raw = json!({
                "id": "e1",
                "type": "Event",
                "attributes": {
                    "name": "Sunday Gathering",
                    "starts_at": "2025-03-02T14:00:00Z",
                    "ends_at": "2025-03-02T16:00:00Z",
                    "location_name": "Main Hall",
                    "image_url": "https://img.test/e1.png",
                    "summary": "Weekly gathering",
                    "description": "Longer text",
                    "visible_in_church_center": true
                },
                "links": { "html": "https://church.test/events/e1" },
                "relationships": {
                    "event_times": { "data": [{ "type": "EventTime", "id": "t1" }] }
                }
            });
            let index = EventTimeIndex::from_included(&included_times());
            let event = normalize_event(&raw, &index).unwrap();

            assert_eq!(event.id, "e1");
            assert_eq!(event.title, "Sunday Gathering");
            assert_eq!(event.starts_at.as_deref(), Some("2025-03-02T14:00:00Z"));
            assert_eq!(event.ends_at.as_deref(), Some("2025-03-02T16:00:00Z"));
            assert_eq!(event.location.as_deref(), Some("Main Hall"));
            assert_eq!(event.link.as_deref(), Some("https://church.test/events/e1"));
            assert_eq!(event.image.as_deref(), Some("https://img.test/e1.png"));
            assert_eq!(event.description.as_deref(), Some("Weekly gathering"));
            assert!(event.visible);
            let times = event.event_times.unwrap();
            assert_eq!(times.len(), 1);
            assert_eq!(times[0].name.as_deref(), Some("Early Service"));
        }

        #[test]
        fn falls_back_to_secondary_fields() {
            let raw = json!({
                "id": "e2",
                "attributes": {
                    "title": "Potluck",
                    "start_at": "2025-04-01T18:00:00Z",
                    "end_at": "2025-04-01T20:00:00Z",
                    "location": "Fellowship Hall",
                    "registration_url": "https://reg.test/e2",
                    "image": "https://img.test/e2.png",
                    "description": "Bring a dish"
                }
            });
            let event = normalize_event(&raw, &EventTimeIndex::default()).unwrap();

            assert_eq!(event.title, "Potluck");
            assert_eq!(event.starts_at.as_deref(), Some("2025-04-01T18:00:00Z"));
            assert_eq!(event.ends_at.as_deref(), Some("2025-04-01T20:00:00Z"));
            assert_eq!(event.location.as_deref(), Some("Fellowship Hall"));
            assert_eq!(event.link.as_deref(), Some("https://reg.test/e2"));
            assert_eq!(event.image.as_deref(), Some("https://img.test/e2.png"));
            assert_eq!(event.description.as_deref(), Some("Bring a dish"));
            assert!(!event.visible);
            assert!(event.event_times.is_none());
        }

        #[test]
        fn missing_title_is_empty() {
            let raw = json!({ "id": "e3", "attributes": {} });
            let event = normalize_event(&raw, &EventTimeIndex::default()).unwrap();
            assert_eq!(event.title, "");
            assert!(event.starts_at.is_none());
        }

        #[test]
        fn visibility_requires_literal_true() {
            let raw = json!({ "id": "e4", "attributes": { "visible_in_church_center": "true" } });
            let event = normalize_event(&raw, &EventTimeIndex::default()).unwrap();
            assert!(!event.visible);
        }

        #[test]
        fn bad_record_is_skipped_in_batch() {
            let raw = vec![
                json!({ "id": "ok1", "attributes": { "name": "One" } }),
                json!({ "id": 99, "attributes": { "name": "Broken" } }),
                json!({ "attributes": { "name": "No id" } }),
                json!({ "id": "ok2", "attributes": { "name": "Two" } }),
            ];
            let events = normalize_events(&raw, &EventTimeIndex::default());
            let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
            assert_eq!(ids, vec!["ok1", "ok2"]);
        }

        #[test]
        fn bad_references_do_not_drop_the_event() {
            let raw = vec![
                json!({
                    "id": "e1",
                    "attributes": { "name": "Baptism Sunday", "visible_in_church_center": true },
                    "relationships": {
                        "event_times": {
                            "data": [{ "type": "EventTime" }, { "type": "EventTime", "id": "t1" }]
                        }
                    }
                }),
                json!({
                    "id": "e2",
                    "attributes": { "name": "Food Drive", "visible_in_church_center": true },
                    "links": null
                }),
            ];
            let index = EventTimeIndex::from_included(&included_times());
            let events = normalize_events(&raw, &index);

            let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
            assert_eq!(ids, vec!["e1", "e2"]);
            assert!(events.iter().all(|e| e.visible));
            let times = events[0].event_times.as_ref().unwrap();
            assert_eq!(times.len(), 1);
            assert_eq!(times[0].name.as_deref(), Some("Early Service"));
            assert!(events[1].link.is_none());
        }
    }

    mod instances {
        use super::*;

        #[test]
        fn maps_instance_fields() {
            let raw = json!({
                "id": "i1",
                "attributes": {
                    "starts_at": "2025-03-02T14:00:00Z",
                    "ends_at": "2025-03-02T16:00:00Z",
                    "recurrence_rule": "FREQ=WEEKLY"
                },
                "relationships": {
                    "event": { "data": { "type": "Event", "id": "e1" } },
                    "event_times": { "data": [{ "type": "EventTime", "id": "t1" }] }
                }
            });
            let index = EventTimeIndex::from_included(&included_times());
            let occurrence = normalize_instance(&raw, &index).unwrap();

            assert_eq!(occurrence.id.as_deref(), Some("i1"));
            assert_eq!(occurrence.event_id.as_deref(), Some("e1"));
            assert_eq!(occurrence.start_at, "2025-03-02T14:00:00Z");
            assert_eq!(occurrence.end_at.as_deref(), Some("2025-03-02T16:00:00Z"));
            assert_eq!(occurrence.recurrence.as_deref(), Some("FREQ=WEEKLY"));
            assert_eq!(occurrence.event_times.as_ref().map(Vec::len), Some(1));
        }

        #[test]
        fn start_at_wins_over_starts_at() {
            let raw = json!({
                "attributes": {
                    "start_at": "2025-03-02T09:00:00Z",
                    "starts_at": "2025-03-02T10:00:00Z",
                    "rrule": "FREQ=DAILY",
                    "recurrence": "ignored"
                }
            });
            let occurrence = normalize_instance(&raw, &EventTimeIndex::default()).unwrap();
            assert_eq!(occurrence.start_at, "2025-03-02T09:00:00Z");
            assert_eq!(occurrence.recurrence.as_deref(), Some("FREQ=DAILY"));
            assert!(occurrence.event_id.is_none());
        }

        #[test]
        fn missing_or_bad_start_is_dropped() {
            let index = EventTimeIndex::default();
            assert!(normalize_instance(&json!({ "attributes": {} }), &index).is_none());
            assert!(
                normalize_instance(&json!({ "attributes": { "start_at": "soon" } }), &index)
                    .is_none()
            );
        }

        #[test]
        fn null_event_time_reference_keeps_instance() {
            let raw = json!({
                "id": "i2",
                "attributes": { "start_at": "2025-03-09T14:00:00Z" },
                "relationships": {
                    "event": { "data": { "type": "Event", "id": "e1" } },
                    "event_times": { "data": [null] }
                }
            });
            let occurrence = normalize_instance(&raw, &EventTimeIndex::from_included(&included_times()))
                .unwrap();
            assert_eq!(occurrence.event_id.as_deref(), Some("e1"));
            assert_eq!(occurrence.start_at, "2025-03-09T14:00:00Z");
            assert!(occurrence.event_times.is_none());
        }

        #[test]
        fn into_instance_keeps_fields() {
            let raw = json!({ "attributes": { "start_at": "2025-03-02T09:00:00Z" } });
            let instance: Instance = normalize_instance(&raw, &EventTimeIndex::default())
                .unwrap()
                .into();
            assert_eq!(instance.start_at, "2025-03-02T09:00:00Z");
            assert!(instance.recurrence.is_none());
            assert!(instance.end_at.is_none());
        }
    }

    #[test]
    fn index_keeps_only_event_times() {
        let index = EventTimeIndex::from_included(&included_times());
        assert_eq!(index.len(), 1);
        let refs = vec![
            ResourceRef { id: "missing".into(), kind: None },
            ResourceRef { id: "t1".into(), kind: Some("EventTime".into()) },
        ];
        let resolved = index.resolve(&refs).unwrap();
        assert_eq!(resolved.len(), 1);
        assert_eq!(resolved[0].id.as_deref(), Some("t1"));
    }
}
