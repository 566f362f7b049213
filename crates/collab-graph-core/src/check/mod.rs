//! Graph validation
//!
//! Validation runs two independent passes over a graph *document* and
//! concatenates their violations:
//!
//! 1. **Schema pass**: structural conformance against a schema descriptor,
//!    sorted by document path.
//! 2. **Logical pass**: invariant rules that re-derive every aggregate from
//!    `nodes` and `links` and compare it with `metadata`.
//!
//! Every check runs even after earlier ones fail, so one call surfaces every
//! problem. Data problems never produce an `Err`; they are violations.
//!
//! The logical pass works on raw JSON and shares no code with the assembler,
//! so drift between how a graph is built and how it is checked shows up as a
//! violation against freshly assembled output.

mod rules;
mod schema;

pub use rules::*;
pub use schema::{JsonSchemaValidator, SchemaValidator, SCHEMA_VIOLATION_CODE};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use crate::config::CheckConfig;
use crate::error::Result;

/// One reported mismatch between expected and actual graph state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Violation {
    /// Stable identifier of the check that produced this violation
    pub code: String,
    /// Location in the document, when one applies
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    /// Human-readable message
    pub message: String,
}

impl Violation {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            path: None,
            message: message.into(),
        }
    }

    /// Attach a document path
    pub fn at(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Outcome of validating one graph document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub valid: bool,
    pub violations: Vec<Violation>,
}

impl ValidationReport {
    pub fn from_violations(violations: Vec<Violation>) -> Self {
        Self {
            valid: violations.is_empty(),
            violations,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Violation messages, one per violation, in report order
    pub fn messages(&self) -> Vec<String> {
        self.violations.iter().map(ToString::to_string).collect()
    }

    /// Whether any violation carries the given code
    pub fn has_code(&self, code: &str) -> bool {
        self.violations.iter().any(|v| v.code == code)
    }
}

/// Runs the schema pass and the invariant rules
pub struct GraphChecker {
    schema: Option<Box<dyn SchemaValidator>>,
    rules: Vec<Box<dyn InvariantRule>>,
    context: RuleContext,
}

impl GraphChecker {
    /// Checker with the built-in rule set and no schema pass
    pub fn new(config: &CheckConfig) -> Self {
        Self {
            schema: None,
            rules: builtin_rules(),
            context: RuleContext {
                event_totals: config.event_totals,
            },
        }
    }

    /// Add the structural pass
    pub fn with_schema(mut self, schema: Box<dyn SchemaValidator>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Identifiers of the invariant rules, in evaluation order
    pub fn rule_ids(&self) -> Vec<&'static str> {
        self.rules.iter().map(|r| r.id()).collect()
    }

    /// Validate a graph document
    pub fn check(&self, document: &Value) -> ValidationReport {
        let mut violations = match &self.schema {
            Some(schema) => schema.validate(document),
            None => Vec::new(),
        };
        let schema_count = violations.len();

        violations.extend(self.check_invariants(document));

        tracing::debug!(
            rules = ?self.rule_ids(),
            schema_violations = schema_count,
            invariant_violations = violations.len() - schema_count,
            "Checked graph document"
        );

        ValidationReport::from_violations(violations)
    }

    /// Logical pass only
    pub fn check_invariants(&self, document: &Value) -> Vec<Violation> {
        let view = match GraphView::from_document(document) {
            Ok(view) => view,
            Err(violation) => return vec![violation],
        };

        self.rules
            .iter()
            .flat_map(|rule| rule.evaluate(&view, &self.context))
            .collect()
    }
}

/// Validate a document against a schema descriptor and the invariant rules
///
/// Fails only when the schema descriptor itself cannot be compiled.
pub fn check(document: &Value, schema: &Value, config: &CheckConfig) -> Result<ValidationReport> {
    let validator = JsonSchemaValidator::new(schema)?;
    Ok(GraphChecker::new(config)
        .with_schema(Box::new(validator))
        .check(document))
}
