//! Graph assembly from aggregates
//!
//! Nodes are ordered by descending event count and links by descending
//! weight. Ties are resolved by the configured [`TieBreak`], which always
//! yields a total order. Derived metadata is computed from the finished node
//! and link lists; declared totals are copied from the event log after
//! validation.

use chrono::NaiveDate;
use serde_json::{Map, Value};
use std::cmp::Reverse;

use crate::aggregate::Aggregates;
use crate::config::TieBreak;
use crate::error::{GraphError, Result};
use crate::model::{Graph, GraphMetadata, Link, Node};

/// Date format of `metadata.generated`
pub const GENERATED_DATE_FORMAT: &str = "%Y-%m-%d";

/// Options controlling one assembly
#[derive(Debug, Clone, Default)]
pub struct AssembleOptions {
    pub tie_break: TieBreak,
    /// Generation date override; today's local date when unset
    pub generated: Option<NaiveDate>,
    /// Provenance label for `metadata.source`
    pub source: Option<String>,
}

/// Declared totals read from the event log metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogTotals {
    pub total_events: u64,
    pub day: u64,
}

impl LogTotals {
    /// Read `total_events` and `last_updated_day` (or `total_days`)
    ///
    /// Both must be positive integers; anything else is fatal.
    pub fn from_metadata(metadata: &Map<String, Value>) -> Result<Self> {
        let total_events = positive_field(metadata, "total_events")?;
        let day = if metadata.contains_key("last_updated_day") {
            positive_field(metadata, "last_updated_day")?
        } else if metadata.contains_key("total_days") {
            positive_field(metadata, "total_days")?
        } else {
            return Err(GraphError::input_format(
                "event log metadata.last_updated_day (or metadata.total_days) is missing",
            ));
        };

        Ok(Self { total_events, day })
    }
}

fn positive_field(metadata: &Map<String, Value>, key: &str) -> Result<u64> {
    match metadata.get(key) {
        None => Err(GraphError::input_format(format!(
            "event log metadata.{} is missing",
            key
        ))),
        Some(value) => match value.as_u64() {
            Some(n) if n > 0 => Ok(n),
            _ => Err(GraphError::input_format(format!(
                "event log metadata.{} must be a positive integer (found {})",
                key, value
            ))),
        },
    }
}

/// Parse a `YYYY-MM-DD` generation date override
pub fn parse_generated_date(raw: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(raw, GENERATED_DATE_FORMAT).map_err(|e| {
        GraphError::input_format(format!(
            "generated date '{}' is not a valid YYYY-MM-DD date: {}",
            raw, e
        ))
    })
}

/// Converts aggregates into an ordered graph
#[derive(Debug, Clone, Default)]
pub struct GraphAssembler {
    options: AssembleOptions,
}

impl GraphAssembler {
    pub fn new(options: AssembleOptions) -> Self {
        Self { options }
    }

    /// Assemble a graph; fails only on invalid log metadata
    pub fn assemble(
        &self,
        aggregates: &Aggregates,
        log_metadata: &Map<String, Value>,
    ) -> Result<Graph> {
        let totals = LogTotals::from_metadata(log_metadata)?;

        let nodes = self.ordered_nodes(aggregates);
        let links = self.ordered_links(aggregates);

        let total_collaborations: u64 = links.iter().map(|l| l.weight).sum();
        let generated = self
            .options
            .generated
            .unwrap_or_else(|| chrono::Local::now().date_naive());

        let metadata = GraphMetadata {
            total_events: totals.total_events,
            total_agents: nodes.len() as u64,
            total_collaborations,
            unique_pairs: links.len() as u64,
            generated: generated.format(GENERATED_DATE_FORMAT).to_string(),
            day: totals.day,
            source: self.options.source.clone(),
        };

        tracing::info!(
            nodes = metadata.total_agents,
            links = metadata.unique_pairs,
            total_collaborations = metadata.total_collaborations,
            generated = %metadata.generated,
            "Assembled collaboration graph"
        );

        Ok(Graph {
            metadata,
            nodes,
            links,
        })
    }

    fn ordered_nodes(&self, aggregates: &Aggregates) -> Vec<Node> {
        let mut entries: Vec<_> = aggregates.agents.iter().collect();
        match self.options.tie_break {
            TieBreak::FirstSeen => {
                entries.sort_by_key(|(_, tally)| (Reverse(tally.count), tally.first_seen))
            }
            TieBreak::Name => {
                entries.sort_by(|(a_name, a), (b_name, b)| {
                    b.count.cmp(&a.count).then_with(|| a_name.cmp(b_name))
                })
            }
        }

        entries
            .into_iter()
            .map(|(name, tally)| Node {
                id: name.clone(),
                events: tally.count,
                family: tally.family.clone(),
            })
            .collect()
    }

    fn ordered_links(&self, aggregates: &Aggregates) -> Vec<Link> {
        let mut entries: Vec<_> = aggregates.pairs.iter().collect();
        match self.options.tie_break {
            TieBreak::FirstSeen => {
                entries.sort_by_key(|(_, tally)| (Reverse(tally.count), tally.first_seen))
            }
            TieBreak::Name => {
                entries.sort_by(|(a_key, a), (b_key, b)| {
                    b.count.cmp(&a.count).then_with(|| a_key.cmp(b_key))
                })
            }
        }

        entries
            .into_iter()
            .map(|(key, tally)| Link {
                source: key.first().to_string(),
                target: key.second().to_string(),
                weight: tally.count,
            })
            .collect()
    }
}
