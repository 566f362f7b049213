//! Structural pass against a JSON Schema descriptor

use jsonschema::{Draft, Validator};
use serde_json::Value;
use std::cmp::Ordering;

use super::Violation;
use crate::error::{GraphError, Result};

/// Code carried by every schema violation
pub const SCHEMA_VIOLATION_CODE: &str = "schema";

/// Trait for structural validators
pub trait SchemaValidator: Send + Sync {
    /// Validate a document; violations sorted by document path
    fn validate(&self, document: &Value) -> Vec<Violation>;
}

/// Draft 2020-12 validator backed by the `jsonschema` crate
pub struct JsonSchemaValidator {
    validator: Validator,
}

impl JsonSchemaValidator {
    /// Compile a schema descriptor
    pub fn new(schema: &Value) -> Result<Self> {
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(schema)
            .map_err(|e| GraphError::schema_error(format!("invalid schema descriptor: {}", e)))?;
        Ok(Self { validator })
    }
}

impl SchemaValidator for JsonSchemaValidator {
    fn validate(&self, document: &Value) -> Vec<Violation> {
        let mut found: Vec<(Vec<PathSegment>, String)> = self
            .validator
            .iter_errors(document)
            .map(|err| (parse_pointer(&err.instance_path.to_string()), err.to_string()))
            .collect();
        // Stable sort keeps the validator's order among errors at one path
        found.sort_by(|(a, _), (b, _)| a.cmp(b));

        found
            .into_iter()
            .map(|(segments, message)| {
                let path = render_path(&segments);
                Violation::new(
                    SCHEMA_VIOLATION_CODE,
                    format!("Schema error at {}: {}", path, message),
                )
                .at(path)
            })
            .collect()
    }
}

/// One step of a document path
#[derive(Debug, Clone, PartialEq, Eq)]
enum PathSegment {
    Index(u64),
    Key(String),
}

impl Ord for PathSegment {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (PathSegment::Index(a), PathSegment::Index(b)) => a.cmp(b),
            (PathSegment::Key(a), PathSegment::Key(b)) => a.cmp(b),
            (PathSegment::Index(_), PathSegment::Key(_)) => Ordering::Less,
            (PathSegment::Key(_), PathSegment::Index(_)) => Ordering::Greater,
        }
    }
}

impl PartialOrd for PathSegment {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Split a JSON pointer (`/nodes/0/id`) into segments
fn parse_pointer(pointer: &str) -> Vec<PathSegment> {
    if pointer.is_empty() {
        return Vec::new();
    }
    pointer
        .trim_start_matches('/')
        .split('/')
        .map(|raw| {
            let segment = raw.replace("~1", "/").replace("~0", "~");
            match segment.parse::<u64>() {
                Ok(index) => PathSegment::Index(index),
                Err(_) => PathSegment::Key(segment),
            }
        })
        .collect()
}

/// Render segments as `nodes/0/id`, or `<root>` for the document itself
fn render_path(segments: &[PathSegment]) -> String {
    if segments.is_empty() {
        return "<root>".to_string();
    }
    segments
        .iter()
        .map(|segment| match segment {
            PathSegment::Index(index) => index.to_string(),
            PathSegment::Key(key) => key.clone(),
        })
        .collect::<Vec<_>>()
        .join("/")
}
