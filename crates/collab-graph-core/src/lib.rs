//! Collaboration Graph Core
//!
//! Builds a collaboration graph from an append-only event log and validates a
//! graph document against a schema descriptor plus logical invariants.
//!
//! ## Pipeline
//!
//! 1. **Normalize** (`normalize`): map raw participant tokens to canonical
//!    identities under one deployment-wide policy.
//! 2. **Aggregate** (`aggregate`): count events per identity and co-occurrences
//!    per unordered identity pair.
//! 3. **Assemble** (`assemble`): order nodes and links deterministically and
//!    derive summary metadata.
//! 4. **Check** (`check`): schema pass plus invariant rules over the serialized
//!    document, reporting every violation at once.
//!
//! ## Example
//!
//! ```rust
//! use collab_graph_core::{build_graph, validate_graph, EventLog, GraphConfig};
//! use serde_json::json;
//!
//! let log = EventLog::from_value(json!({
//!     "metadata": {"total_events": 2, "last_updated_day": 4},
//!     "events": [
//!         {"agents": ["A", "B"]},
//!         {"agents": ["A", "B", "C", "all"]}
//!     ]
//! }))
//! .unwrap();
//!
//! let config = GraphConfig::default();
//! let generated = chrono::NaiveDate::from_ymd_opt(2025, 4, 2);
//! let graph = build_graph(&log, &config, generated).unwrap();
//! assert_eq!(graph.metadata.total_collaborations, 4);
//!
//! let schema = json!({"type": "object"});
//! let report = validate_graph(&graph.to_value().unwrap(), &schema, &config).unwrap();
//! assert!(report.is_valid());
//! ```

pub mod aggregate;
pub mod assemble;
pub mod check;
pub mod config;
pub mod error;
pub mod io;
pub mod model;
pub mod normalize;

pub use aggregate::{AggregateStats, Aggregates, Aggregator, PairKey};
pub use assemble::{parse_generated_date, AssembleOptions, GraphAssembler, LogTotals};
pub use check::{GraphChecker, JsonSchemaValidator, ValidationReport, Violation};
pub use config::{CheckConfig, EventTotalsPolicy, GraphConfig, NormalizationConfig, TieBreak};
pub use error::{GraphError, Result};
pub use model::{EventLog, Graph, GraphMetadata, Identity, Link, Node};
pub use normalize::TokenNormalizer;

use chrono::NaiveDate;
use serde_json::Value;

/// Conventional file name of the graph artifact
pub const GRAPH_FILE: &str = "graph-data.json";

/// Conventional location of the schema descriptor, relative to the project root
pub const SCHEMA_FILE: &str = "schema/graph-data.schema.json";

/// Run normalization, aggregation and assembly over a loaded event log
pub fn build_graph(
    log: &EventLog,
    config: &GraphConfig,
    generated: Option<NaiveDate>,
) -> Result<Graph> {
    let normalizer = normalize::from_config(&config.normalization);
    let aggregates = Aggregator::new(normalizer.as_ref()).aggregate(&log.events);

    if aggregates.stats.events_malformed > 0 {
        tracing::info!(
            skipped = aggregates.stats.events_malformed,
            "Skipped events without an agents list"
        );
    }

    GraphAssembler::new(AssembleOptions {
        tie_break: config.ordering.tie_break,
        generated,
        source: config.provenance.source.clone(),
    })
    .assemble(&aggregates, &log.metadata)
}

/// Validate a graph document against a schema descriptor and the invariant rules
pub fn validate_graph(
    document: &Value,
    schema: &Value,
    config: &GraphConfig,
) -> Result<ValidationReport> {
    check::check(document, schema, &config.checks)
}
