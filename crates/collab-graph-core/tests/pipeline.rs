//! End-to-end tests for the build and check pipeline
//!
//! Builds graphs from in-memory event logs and runs the checker, with the
//! shipped schema descriptor, against both assembler output and hand-edited
//! documents.

use chrono::NaiveDate;
use collab_graph_core::check::{check, GraphChecker};
use collab_graph_core::config::{CheckConfig, OrderingConfig, RosterEntry};
use collab_graph_core::io::render_graph;
use collab_graph_core::{
    build_graph, validate_graph, EventLog, EventTotalsPolicy, GraphConfig, GraphError,
    NormalizationConfig, TieBreak,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;

const SCHEMA: &str = include_str!("../../../schema/graph-data.schema.json");

fn schema() -> Value {
    serde_json::from_str(SCHEMA).unwrap()
}

fn generated() -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(2025, 4, 2)
}

fn log(total_events: u64, events: Value) -> EventLog {
    EventLog::from_value(json!({
        "metadata": {"total_events": total_events, "last_updated_day": 30},
        "events": events
    }))
    .unwrap()
}

fn config_with(tie_break: TieBreak, event_totals: EventTotalsPolicy) -> GraphConfig {
    GraphConfig {
        ordering: OrderingConfig { tie_break },
        checks: CheckConfig { event_totals },
        ..GraphConfig::default()
    }
}

#[test]
fn test_two_event_example() {
    let graph = build_graph(
        &log(2, json!([{"agents": ["A", "B"]}, {"agents": ["A", "B", "C"]}])),
        &GraphConfig::default(),
        generated(),
    )
    .unwrap();

    let nodes: Vec<(&str, u64)> = graph.nodes.iter().map(|n| (n.id.as_str(), n.events)).collect();
    assert_eq!(nodes, vec![("A", 2), ("B", 2), ("C", 1)]);

    let links: Vec<(&str, &str, u64)> = graph
        .links
        .iter()
        .map(|l| (l.source.as_str(), l.target.as_str(), l.weight))
        .collect();
    assert_eq!(links, vec![("A", "B", 2), ("A", "C", 1), ("B", "C", 1)]);

    assert_eq!(graph.metadata.total_agents, 3);
    assert_eq!(graph.metadata.total_collaborations, 4);
    assert_eq!(graph.metadata.unique_pairs, 3);
    assert_eq!(graph.metadata.generated, "2025-04-02");
    assert_eq!(graph.metadata.day, 30);
}

#[test]
fn test_repeated_token_counts_once() {
    let graph = build_graph(
        &log(1, json!([{"agents": ["X", "X", "Y"]}])),
        &GraphConfig::default(),
        generated(),
    )
    .unwrap();

    assert_eq!(graph.nodes[0].events, 1);
    assert_eq!(graph.nodes[1].events, 1);
    assert_eq!(graph.links.len(), 1);
    assert_eq!(graph.links[0].weight, 1);
}

#[test]
fn test_assembler_output_passes_checker() {
    let events = json!([
        {"agents": ["Claude Opus", "GPT-4o", "all"]},
        {"agents": ["Gemini Pro", "o3"]},
        {"agents": ["o3", "Claude Opus", "Gemini Pro"]},
        {"agents": ["all"]},
        {"title": "no participants"}
    ]);

    for tie_break in [TieBreak::FirstSeen, TieBreak::Name] {
        let config = config_with(tie_break, EventTotalsPolicy::LowerBound);
        let graph = build_graph(&log(3, events.clone()), &config, generated()).unwrap();
        let report = validate_graph(&graph.to_value().unwrap(), &schema(), &config).unwrap();
        assert!(report.is_valid(), "{:?}: {:?}", tie_break, report.messages());
    }
}

#[test]
fn test_allow_list_output_passes_checker() {
    let roster = |name: &str, family: &str| RosterEntry {
        name: name.to_string(),
        family: family.to_string(),
    };
    let config = GraphConfig {
        normalization: NormalizationConfig::AllowList {
            aliases: BTreeMap::from([(
                "opus@agentvillage.org".to_string(),
                "Claude Opus".to_string(),
            )]),
            agents: vec![roster("Claude Opus", "claude"), roster("o3", "openai")],
        },
        ..GraphConfig::default()
    };
    let events = json!([
        {"agents": ["opus@agentvillage.org", "o3", "guest"]},
        {"agents": ["Claude Opus", "all"]}
    ]);

    let graph = build_graph(&log(2, events), &config, generated()).unwrap();
    assert_eq!(graph.nodes[0].id, "Claude Opus");
    assert_eq!(graph.nodes[0].events, 2);
    assert_eq!(graph.nodes[0].family.as_deref(), Some("claude"));
    assert_eq!(graph.metadata.total_agents, 2);

    let report = validate_graph(&graph.to_value().unwrap(), &schema(), &config).unwrap();
    assert!(report.is_valid(), "{:?}", report.messages());
}

#[test]
fn test_exact_policy_accepts_matching_totals() {
    let config = config_with(TieBreak::Name, EventTotalsPolicy::Exact);
    let graph = build_graph(
        &log(4, json!([{"agents": ["A", "B"]}, {"agents": ["A", "B"]}])),
        &config,
        generated(),
    )
    .unwrap();

    let report = validate_graph(&graph.to_value().unwrap(), &schema(), &config).unwrap();
    assert!(report.is_valid(), "{:?}", report.messages());
}

#[test]
fn test_declared_total_above_node_sum_is_reported() {
    // Five declared events, only three node-events recorded
    let events = json!([{"agents": ["A", "B"]}, {"agents": ["C"]}]);

    for policy in [EventTotalsPolicy::LowerBound, EventTotalsPolicy::Exact] {
        let config = config_with(TieBreak::FirstSeen, policy);
        let graph = build_graph(&log(5, events.clone()), &config, generated()).unwrap();
        let report = validate_graph(&graph.to_value().unwrap(), &schema(), &config).unwrap();
        assert!(report.has_code("event-total-mismatch"), "{:?}", policy);
    }
}

#[test]
fn test_lower_bound_allows_slack_that_exact_rejects() {
    let events = json!([{"agents": ["A", "B"]}, {"agents": ["A", "C"]}]);
    let lower = config_with(TieBreak::FirstSeen, EventTotalsPolicy::LowerBound);
    let exact = config_with(TieBreak::FirstSeen, EventTotalsPolicy::Exact);

    let graph = build_graph(&log(2, events), &lower, generated()).unwrap();
    let document = graph.to_value().unwrap();

    assert!(validate_graph(&document, &schema(), &lower).unwrap().is_valid());
    let report = validate_graph(&document, &schema(), &exact).unwrap();
    assert!(report.has_code("event-total-mismatch"));
}

#[test]
fn test_checker_reports_every_tampered_field() {
    let config = GraphConfig::default();
    let graph = build_graph(
        &log(2, json!([{"agents": ["A", "B"]}, {"agents": ["A", "B", "C"]}])),
        &config,
        generated(),
    )
    .unwrap();

    let mut document = graph.to_value().unwrap();
    document["metadata"]["total_agents"] = json!(7);
    document["metadata"]["total_collaborations"] = json!(40);
    document["nodes"][2]["id"] = json!("A");
    document["links"][0]["target"] = json!("Z");

    let report = validate_graph(&document, &schema(), &config).unwrap();
    for code in [
        "total-agents-mismatch",
        "total-collaborations-mismatch",
        "duplicate-node-id",
        "unknown-node-reference",
    ] {
        assert!(report.has_code(code), "missing {}: {:?}", code, report.messages());
    }
}

#[test]
fn test_duplicate_node_id_does_not_crash() {
    let document = json!({
        "metadata": {
            "total_events": 2,
            "total_agents": 2,
            "total_collaborations": 1,
            "unique_pairs": 1,
            "generated": "2025-04-02",
            "day": 3
        },
        "nodes": [{"id": "A", "events": 1}, {"id": "A", "events": 1}],
        "links": [{"source": "A", "target": "A", "weight": 1}]
    });

    let report = check(&document, &schema(), &CheckConfig::default()).unwrap();
    assert!(!report.is_valid());
    assert!(report.has_code("duplicate-node-id"));
    assert!(report.has_code("self-link"));
}

#[test]
fn test_misuse_yields_single_violation() {
    let checker = GraphChecker::new(&CheckConfig::default());
    for document in [
        json!([]),
        json!({"metadata": [], "nodes": [], "links": []}),
        json!({"metadata": {}, "nodes": {}, "links": []}),
    ] {
        let violations = checker.check_invariants(&document);
        assert_eq!(violations.len(), 1, "{}", document);
        assert_eq!(
            violations[0].message,
            "metadata, nodes, and links must be present and correctly typed"
        );
    }
}

#[test]
fn test_schema_violations_come_first_and_sorted() {
    let document = json!({
        "metadata": {
            "total_events": 1,
            "total_agents": 1,
            "total_collaborations": 1,
            "unique_pairs": 1,
            "generated": "2025-04-02",
            "day": 1
        },
        "nodes": [{"id": "A", "events": "1"}, {"id": 5, "events": 1}],
        "links": []
    });

    let report = check(&document, &schema(), &CheckConfig::default()).unwrap();
    let schema_messages: Vec<String> = report
        .violations
        .iter()
        .filter(|v| v.code == "schema")
        .map(|v| v.message.clone())
        .collect();

    assert!(schema_messages.len() >= 2);
    assert!(schema_messages[0].starts_with("Schema error at nodes/0/events:"));
    assert!(schema_messages[1].starts_with("Schema error at nodes/1/id:"));
    assert_eq!(report.violations[0].code, "schema");
}

#[test]
fn test_rendering_is_stable() {
    let events = json!([
        {"agents": ["B", "A"]},
        {"agents": ["C", "A", "B"]},
        {"agents": ["C", "D"]}
    ]);
    let config = GraphConfig::default();

    let first = build_graph(&log(3, events.clone()), &config, generated()).unwrap();
    let second = build_graph(&log(3, events), &config, generated()).unwrap();
    let first = render_graph(&first).unwrap();
    let second = render_graph(&second).unwrap();

    assert_eq!(first, second);
    assert!(first.ends_with("}\n"));
}

#[test]
fn test_invalid_events_field_is_fatal() {
    let err = EventLog::from_value(json!({
        "metadata": {"total_events": 1, "last_updated_day": 1},
        "events": "not a list"
    }))
    .unwrap_err();
    assert!(matches!(err, GraphError::InputFormat(_)));
}

#[test]
fn test_missing_day_is_fatal() {
    let log = EventLog::from_value(json!({
        "metadata": {"total_events": 1},
        "events": [{"agents": ["A", "B"]}]
    }))
    .unwrap();

    let err = build_graph(&log, &GraphConfig::default(), generated()).unwrap_err();
    assert!(matches!(err, GraphError::InputFormat(_)));
}
