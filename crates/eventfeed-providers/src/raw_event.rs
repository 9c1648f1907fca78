//! Raw JSON:API records as the upstream returns them.
//!
//! A response document has a `data` array of primary records and an
//! optional `included` array of side-loaded resources. Records are kept as
//! [`serde_json::Value`] until the normalizer or the content policy looks at
//! them, so one malformed record never fails a whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value};

use crate::error::{ProviderError, ProviderResult};

/// JSON:API `type` of side-loaded event time resources.
pub const EVENT_TIME_TYPE: &str = "EventTime";

/// A parsed response document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JsonApiDocument {
    /// `None` when `data` was absent or null.
    pub data: Option<Vec<Value>>,
    pub included: Vec<Value>,
}

impl JsonApiDocument {
    /// Parses a response body.
    ///
    /// # Errors
    ///
    /// Returns [`InvalidResponse`] if the body is not JSON or if `data` is
    /// present but neither an array nor null.
    ///
    /// [`InvalidResponse`]: crate::error::ProviderErrorCode::InvalidResponse
    pub fn parse(body: &str) -> ProviderResult<Self> {
        let mut root: Value = serde_json::from_str(body).map_err(|e| {
            ProviderError::invalid_response(format!("failed to parse response: {}", e))
                .with_source(e)
        })?;

        let data = match root.get_mut("data").map(Value::take) {
            None | Some(Value::Null) => None,
            Some(Value::Array(items)) => Some(items),
            Some(other) => {
                return Err(ProviderError::invalid_response(format!(
                    "unexpected response shape: data is {}",
                    json_kind(&other)
                )));
            }
        };

        let included = match root.get_mut("included").map(Value::take) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        };

        Ok(Self { data, included })
    }

    /// Primary records; empty when `data` was missing.
    pub fn records(&self) -> &[Value] {
        self.data.as_deref().unwrap_or(&[])
    }

    pub fn has_data(&self) -> bool {
        self.data.is_some()
    }
}

/// One JSON:API resource object.
///
/// Only `id` and `type` are strict. Attributes, links and relationships of an
/// unexpected shape read as empty, and a malformed relationship reference is
/// dropped on its own.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
    #[serde(default, deserialize_with = "or_default")]
    pub attributes: Map<String, Value>,
    #[serde(default, deserialize_with = "or_default")]
    pub relationships: RawRelationships,
    #[serde(default, deserialize_with = "or_default")]
    pub links: Map<String, Value>,
}

impl RawRecord {
    /// Deserializes a record from a borrowed value.
    pub fn from_value(value: &Value) -> ProviderResult<Self> {
        Self::deserialize(value).map_err(|e| {
            ProviderError::invalid_response(format!("malformed record: {}", e)).with_source(e)
        })
    }

    /// Returns a string attribute; non-string values read as absent.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).and_then(Value::as_str)
    }

    pub fn link(&self, name: &str) -> Option<&str> {
        self.links.get(name).and_then(Value::as_str)
    }

    /// Id of the parent event, for instance records.
    pub fn parent_event_id(&self) -> Option<&str> {
        self.relationships
            .event
            .as_ref()
            .and_then(|rel| rel.data.as_ref())
            .map(|r| r.id.as_str())
    }

    /// Referenced event time resources, in declaration order.
    pub fn event_time_refs(&self) -> &[ResourceRef] {
        self.relationships
            .event_times
            .as_ref()
            .and_then(|rel| rel.data.as_deref())
            .unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRelationships {
    #[serde(default, deserialize_with = "or_default")]
    pub event: Option<ToOne>,
    #[serde(default, deserialize_with = "or_default")]
    pub event_times: Option<ToMany>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToOne {
    #[serde(default, deserialize_with = "or_default")]
    pub data: Option<ResourceRef>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ToMany {
    #[serde(default, deserialize_with = "valid_refs")]
    pub data: Option<Vec<ResourceRef>>,
}

/// Reads `T`, falling back to its default when the value has another shape.
fn or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(T::deserialize(value).unwrap_or_default())
}

/// Reads a reference array, keeping only well-formed entries.
fn valid_refs<'de, D>(deserializer: D) -> Result<Option<Vec<ResourceRef>>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Array(items) => Ok(Some(
            items
                .into_iter()
                .filter_map(|item| ResourceRef::deserialize(item).ok())
                .collect(),
        )),
        _ => Ok(None),
    }
}

/// A `{ "type": ..., "id": ... }` resource identifier.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ResourceRef {
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

/// Where a normalized field is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Attribute(&'static str),
    Link(&'static str),
}

impl Field {
    pub fn read<'a>(&self, record: &'a RawRecord) -> Option<&'a str> {
        match *self {
            Field::Attribute(name) => record.attr(name),
            Field::Link(name) => record.link(name),
        }
    }
}

/// Returns the first candidate that holds a string.
pub fn first_present<'a>(record: &'a RawRecord, candidates: &[Field]) -> Option<&'a str> {
    candidates.iter().find_map(|field| field.read(record))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
