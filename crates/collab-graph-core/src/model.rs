//! Data model for event logs and collaboration graphs
//!
//! The event log is kept as raw JSON so individual malformed events can be
//! skipped rather than failing deserialization of the whole log. The graph is
//! fully typed; its field order is the serialized key order.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{GraphError, Result};

/// Canonical participant identity produced by a normalizer
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Identity {
    /// Canonical agent name
    pub name: String,
    /// Optional grouping label, e.g. a model family
    pub family: Option<String>,
}

impl Identity {
    /// Identity without a family
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: None,
        }
    }

    /// Identity tagged with a family
    pub fn with_family(name: impl Into<String>, family: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            family: Some(family.into()),
        }
    }
}

/// A loaded event log
///
/// Only `metadata` and `events` are interpreted; every other top-level field
/// and every event field other than `agents` is ignored.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    /// Log-level metadata as declared by the log
    pub metadata: Map<String, Value>,
    /// Raw events, in log order
    pub events: Vec<Value>,
}

impl EventLog {
    /// Interpret a parsed JSON document as an event log
    ///
    /// A missing `events` field is an empty log. An `events` field that is
    /// present but not an array is fatal. A non-object `metadata` is treated as
    /// empty, which later surfaces as missing required fields.
    pub fn from_value(doc: Value) -> Result<Self> {
        let mut root = match doc {
            Value::Object(map) => map,
            other => {
                return Err(GraphError::input_format(format!(
                    "event log must be a JSON object (found {})",
                    json_type_name(&other)
                )))
            }
        };

        let events = match root.remove("events") {
            None => Vec::new(),
            Some(Value::Array(events)) => events,
            Some(other) => {
                return Err(GraphError::input_format(format!(
                    "event log 'events' field must be a list (found {})",
                    json_type_name(&other)
                )))
            }
        };

        let metadata = match root.remove("metadata") {
            Some(Value::Object(map)) => map,
            _ => Map::new(),
        };

        Ok(Self { metadata, events })
    }
}

/// One graph node per identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Node {
    pub id: String,
    pub events: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family: Option<String>,
}

/// One graph link per unordered identity pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub source: String,
    pub target: String,
    pub weight: u64,
}

/// Summary statistics attached to a graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphMetadata {
    /// Declared event count, copied from the event log
    pub total_events: u64,
    /// Number of nodes
    pub total_agents: u64,
    /// Sum of link weights
    pub total_collaborations: u64,
    /// Number of distinct unordered pairs
    pub unique_pairs: u64,
    /// Generation date, `YYYY-MM-DD`
    pub generated: String,
    /// Declared day counter, copied from the event log
    pub day: u64,
    /// Free-text provenance label
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// The assembled collaboration graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Graph {
    pub metadata: GraphMetadata,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
}

impl Graph {
    /// Serialize into a JSON document
    pub fn to_value(&self) -> Result<Value> {
        serde_json::to_value(self).map_err(|e| GraphError::SerializationError(e.to_string()))
    }
}

/// JSON type name used in error messages
pub fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
