//! Invariant rules for the logical pass
//!
//! Each rule re-derives one fact from the raw `nodes`/`links` arrays and
//! compares it with what the document declares. Rules never fail; values of
//! the wrong type are reported or skipped, never unwrapped.

use serde_json::{Map, Value};
use std::collections::{BTreeMap, BTreeSet};

use super::Violation;
use crate::config::EventTotalsPolicy;

/// Message reported when the document cannot be viewed as a graph at all
pub const MISUSE_MESSAGE: &str = "metadata, nodes, and links must be present and correctly typed";

/// Metadata counts that must always be positive integers
const REQUIRED_COUNTS: [&str; 5] = [
    "total_events",
    "total_agents",
    "total_collaborations",
    "unique_pairs",
    "day",
];

/// Metadata counts that must be positive integers when declared
const OPTIONAL_COUNTS: [&str; 1] = ["total_links"];

/// Read-only view of a graph document
///
/// Absent `metadata`, `nodes` or `links` read as empty.
#[derive(Debug, Clone, Copy)]
pub struct GraphView<'a> {
    metadata: Option<&'a Map<String, Value>>,
    pub nodes: &'a [Value],
    pub links: &'a [Value],
}

impl<'a> GraphView<'a> {
    /// Build a view, or the single misuse violation when fields are mistyped
    pub fn from_document(document: &'a Value) -> Result<Self, Violation> {
        let misuse = || Violation::new("malformed-graph", MISUSE_MESSAGE);
        let root = document.as_object().ok_or_else(misuse)?;

        let metadata = match root.get("metadata") {
            None => None,
            Some(Value::Object(map)) => Some(map),
            Some(_) => return Err(misuse()),
        };
        let nodes = match root.get("nodes") {
            None => &[][..],
            Some(Value::Array(nodes)) => nodes.as_slice(),
            Some(_) => return Err(misuse()),
        };
        let links = match root.get("links") {
            None => &[][..],
            Some(Value::Array(links)) => links.as_slice(),
            Some(_) => return Err(misuse()),
        };

        Ok(Self {
            metadata,
            nodes,
            links,
        })
    }

    /// Declared metadata value
    pub fn meta(&self, key: &str) -> Option<&'a Value> {
        self.metadata.and_then(|m| m.get(key))
    }

    /// Declared metadata value when it is a non-negative integer
    pub fn meta_count(&self, key: &str) -> Option<u64> {
        self.meta(key).and_then(Value::as_u64)
    }

    fn node_field(&self, index: usize, key: &str) -> Option<&'a Value> {
        self.nodes.get(index).and_then(|n| n.get(key))
    }

    fn link_field(&self, index: usize, key: &str) -> Option<&'a Value> {
        self.links.get(index).and_then(|l| l.get(key))
    }

    /// Node ids in document order; nodes without an id are skipped
    fn node_ids(&self) -> Vec<&'a Value> {
        (0..self.nodes.len())
            .filter_map(|i| self.node_field(i, "id"))
            .collect()
    }
}

/// Evaluation settings shared by all rules
#[derive(Debug, Clone, Copy, Default)]
pub struct RuleContext {
    pub event_totals: EventTotalsPolicy,
}

/// Trait for logical invariants over a graph document
pub trait InvariantRule: Send + Sync {
    /// Rule identifier
    fn id(&self) -> &'static str;

    /// Evaluate the rule; an empty result means the invariant holds
    fn evaluate(&self, graph: &GraphView<'_>, context: &RuleContext) -> Vec<Violation>;
}

/// Built-in rules in reporting order
pub fn builtin_rules() -> Vec<Box<dyn InvariantRule>> {
    vec![
        Box::new(PositiveCountsRule),
        Box::new(UniqueNodeIdsRule),
        Box::new(LinkEndpointsRule),
        Box::new(SelfLinkRule),
        Box::new(EventTotalsRule),
        Box::new(AgentCountRule),
        Box::new(LinkCountRule),
        Box::new(CollaborationTotalRule),
        Box::new(UniquePairsRule),
    ]
}

fn is_positive_integer(value: Option<&Value>) -> bool {
    matches!(value.and_then(Value::as_u64), Some(n) if n > 0)
}

/// Render a possibly-missing value for a message
fn describe(value: Option<&Value>) -> String {
    match value {
        Some(value) => value.to_string(),
        None => "missing".to_string(),
    }
}

/// Comparison key for an id; `1` and `"1"` are different ids
fn id_key(value: &Value) -> String {
    value.to_string()
}

/// Render an id; strings verbatim, anything else as JSON
fn id_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Metadata totals, node events and link weights are positive integers
pub struct PositiveCountsRule;

impl InvariantRule for PositiveCountsRule {
    fn id(&self) -> &'static str {
        "positive_counts"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        let mut violations = Vec::new();

        let declared_optional = OPTIONAL_COUNTS
            .iter()
            .filter(|key| graph.meta(key).is_some());
        for key in REQUIRED_COUNTS.iter().chain(declared_optional) {
            let value = graph.meta(key);
            if !is_positive_integer(value) {
                violations.push(
                    Violation::new(
                        "non-positive-count",
                        format!(
                            "metadata.{} must be a positive integer (found {})",
                            key,
                            describe(value)
                        ),
                    )
                    .at(format!("metadata.{}", key)),
                );
            }
        }

        for index in 0..graph.nodes.len() {
            let value = graph.node_field(index, "events");
            if !is_positive_integer(value) {
                violations.push(
                    Violation::new(
                        "non-positive-count",
                        format!(
                            "nodes[{}].events must be a positive integer (found {})",
                            index,
                            describe(value)
                        ),
                    )
                    .at(format!("nodes[{}].events", index)),
                );
            }
        }

        for index in 0..graph.links.len() {
            let value = graph.link_field(index, "weight");
            if !is_positive_integer(value) {
                violations.push(
                    Violation::new(
                        "non-positive-count",
                        format!(
                            "links[{}].weight must be a positive integer (found {})",
                            index,
                            describe(value)
                        ),
                    )
                    .at(format!("links[{}].weight", index)),
                );
            }
        }

        violations
    }
}

/// Node ids are unique
pub struct UniqueNodeIdsRule;

impl InvariantRule for UniqueNodeIdsRule {
    fn id(&self) -> &'static str {
        "unique_node_ids"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        let keys: Vec<(String, &Value)> = graph
            .node_ids()
            .into_iter()
            .map(|id| (id_key(id), id))
            .collect();
        let mut occurrences: BTreeMap<&str, usize> = BTreeMap::new();
        for (key, _) in &keys {
            *occurrences.entry(key.as_str()).or_default() += 1;
        }

        // Report each duplicate once, in order of first appearance
        let mut reported = BTreeSet::new();
        let duplicates: Vec<String> = keys
            .iter()
            .filter(|(key, _)| occurrences[key.as_str()] > 1 && reported.insert(key.as_str()))
            .map(|(_, id)| id_text(id))
            .collect();

        if duplicates.is_empty() {
            return Vec::new();
        }

        vec![Violation::new(
            "duplicate-node-id",
            format!("Duplicate node ids found: {}", duplicates.join(", ")),
        )
        .at("nodes")]
    }
}

/// Link endpoints reference declared node ids
pub struct LinkEndpointsRule;

impl InvariantRule for LinkEndpointsRule {
    fn id(&self) -> &'static str {
        "link_endpoints"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        let known: BTreeSet<String> = graph.node_ids().into_iter().map(id_key).collect();
        let mut violations = Vec::new();

        for index in 0..graph.links.len() {
            for end in ["source", "target"] {
                let endpoint = graph.link_field(index, end);
                let resolves = endpoint.map(|v| known.contains(&id_key(v))).unwrap_or(false);
                if !resolves {
                    let shown = endpoint.map(id_text).unwrap_or_else(|| "missing".to_string());
                    violations.push(
                        Violation::new(
                            "unknown-node-reference",
                            format!(
                                "links[{}].{} references unknown node id '{}'",
                                index, end, shown
                            ),
                        )
                        .at(format!("links[{}].{}", index, end)),
                    );
                }
            }
        }

        violations
    }
}

/// No link connects a node to itself
pub struct SelfLinkRule;

impl InvariantRule for SelfLinkRule {
    fn id(&self) -> &'static str {
        "no_self_links"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        (0..graph.links.len())
            .filter_map(|index| {
                let source = graph.link_field(index, "source")?;
                let target = graph.link_field(index, "target")?;
                (source == target).then(|| {
                    Violation::new(
                        "self-link",
                        format!(
                            "links[{}] connects node '{}' to itself",
                            index,
                            id_text(source)
                        ),
                    )
                    .at(format!("links[{}]", index))
                })
            })
            .collect()
    }
}

/// Summed node events agree with the declared event total
pub struct EventTotalsRule;

impl InvariantRule for EventTotalsRule {
    fn id(&self) -> &'static str {
        "event_totals"
    }

    fn evaluate(&self, graph: &GraphView<'_>, context: &RuleContext) -> Vec<Violation> {
        let Some(total) = graph.meta("total_events").and_then(Value::as_i64) else {
            return Vec::new();
        };

        let events: Vec<(usize, i64)> = (0..graph.nodes.len())
            .filter_map(|i| graph.node_field(i, "events").and_then(Value::as_i64).map(|e| (i, e)))
            .collect();
        let sum: i64 = events.iter().map(|(_, e)| *e).fold(0, i64::saturating_add);

        let mut violations = Vec::new();
        match context.event_totals {
            EventTotalsPolicy::LowerBound if sum < total => violations.push(
                Violation::new(
                    "event-total-mismatch",
                    format!(
                        "metadata.total_events ({}) exceeds sum of node events ({})",
                        total, sum
                    ),
                )
                .at("metadata.total_events"),
            ),
            EventTotalsPolicy::Exact if sum != total => violations.push(
                Violation::new(
                    "event-total-mismatch",
                    format!(
                        "metadata.total_events ({}) does not match sum of node events ({})",
                        total, sum
                    ),
                )
                .at("metadata.total_events"),
            ),
            _ => {}
        }

        for (index, count) in events {
            if count > total {
                violations.push(
                    Violation::new(
                        "node-events-exceed-total",
                        format!(
                            "nodes[{}].events ({}) exceeds metadata.total_events ({})",
                            index, count, total
                        ),
                    )
                    .at(format!("nodes[{}].events", index)),
                );
            }
        }

        violations
    }
}

/// `metadata.total_agents` equals the number of nodes
pub struct AgentCountRule;

impl InvariantRule for AgentCountRule {
    fn id(&self) -> &'static str {
        "total_agents"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        let expected = graph.nodes.len() as u64;
        if graph.meta_count("total_agents") == Some(expected) {
            return Vec::new();
        }
        vec![Violation::new(
            "total-agents-mismatch",
            format!(
                "metadata.total_agents ({}) does not match number of nodes ({})",
                describe(graph.meta("total_agents")),
                expected
            ),
        )
        .at("metadata.total_agents")]
    }
}

/// `metadata.total_links`, when declared, equals the number of links
pub struct LinkCountRule;

impl InvariantRule for LinkCountRule {
    fn id(&self) -> &'static str {
        "total_links"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        let Some(declared) = graph.meta("total_links") else {
            return Vec::new();
        };
        let expected = graph.links.len() as u64;
        if declared.as_u64() == Some(expected) {
            return Vec::new();
        }
        vec![Violation::new(
            "total-links-mismatch",
            format!(
                "metadata.total_links ({}) does not match number of links ({})",
                declared, expected
            ),
        )
        .at("metadata.total_links")]
    }
}

/// `metadata.total_collaborations` equals the sum of link weights
pub struct CollaborationTotalRule;

impl InvariantRule for CollaborationTotalRule {
    fn id(&self) -> &'static str {
        "total_collaborations"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        let expected: i64 = (0..graph.links.len())
            .filter_map(|i| graph.link_field(i, "weight").and_then(Value::as_i64))
            .fold(0, i64::saturating_add);

        let declared = graph.meta("total_collaborations");
        if declared.and_then(Value::as_i64) == Some(expected) {
            return Vec::new();
        }
        vec![Violation::new(
            "total-collaborations-mismatch",
            format!(
                "metadata.total_collaborations ({}) does not match sum of link weights ({})",
                describe(declared),
                expected
            ),
        )
        .at("metadata.total_collaborations")]
    }
}

/// `metadata.unique_pairs`, when declared, equals the distinct unordered pairs in links
pub struct UniquePairsRule;

impl InvariantRule for UniquePairsRule {
    fn id(&self) -> &'static str {
        "unique_pairs"
    }

    fn evaluate(&self, graph: &GraphView<'_>, _context: &RuleContext) -> Vec<Violation> {
        let Some(declared) = graph.meta("unique_pairs") else {
            return Vec::new();
        };

        let render = |v: Option<&Value>| v.map(Value::to_string).unwrap_or_default();
        let pairs: BTreeSet<(String, String)> = graph
            .links
            .iter()
            .filter(|link| link.is_object())
            .map(|link| {
                let a = render(link.get("source"));
                let b = render(link.get("target"));
                if a <= b {
                    (a, b)
                } else {
                    (b, a)
                }
            })
            .collect();

        let expected = pairs.len() as u64;
        if declared.as_u64() == Some(expected) {
            return Vec::new();
        }
        vec![Violation::new(
            "unique-pairs-mismatch",
            format!(
                "metadata.unique_pairs ({}) does not match number of unique unordered pairs ({})",
                declared, expected
            ),
        )
        .at("metadata.unique_pairs")]
    }
}
