//! Integration tests for the collab-graph CLI
//!
//! Drives the build and validate commands end to end against temporary
//! directories and the schema descriptor shipped with the repository.

use collab_graph_cli::cli::commands::{execute_build, execute_validate, GlobalOptions};
use collab_graph_cli::{ExitCode, OutputFormat};
use serde_json::json;
use std::path::{Path, PathBuf};

fn repo_file(relative: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("../..")
        .join(relative)
}

/// Temporary project root with an event log and the shipped schema
fn project(events: serde_json::Value) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("events.json"), events.to_string()).unwrap();
    std::fs::create_dir_all(dir.path().join("schema")).unwrap();
    std::fs::copy(
        repo_file("schema/graph-data.schema.json"),
        dir.path().join("schema/graph-data.schema.json"),
    )
    .unwrap();
    dir
}

fn village_log() -> serde_json::Value {
    json!({
        "metadata": {"total_events": 4, "last_updated_day": 21},
        "events": [
            {"id": 1, "agents": ["Claude Opus", "GPT-4o"], "title": "Kickoff"},
            {"id": 2, "agents": ["Claude Opus", "GPT-4o", "Gemini Pro"]},
            {"id": 3, "agents": ["all"]},
            {"id": 4, "agents": ["Gemini Pro", "Gemini Pro", "o3"]}
        ]
    })
}

fn quiet() -> GlobalOptions {
    GlobalOptions {
        quiet: true,
        config: None,
    }
}

fn build(dir: &Path, options: &GlobalOptions) -> Result<ExitCode, collab_graph_core::GraphError> {
    execute_build(
        &dir.join("events.json"),
        &dir.join("graph-data.json"),
        Some("2025-04-02"),
        options,
    )
}

#[test]
fn test_build_then_validate() {
    let dir = project(village_log());

    assert_eq!(build(dir.path(), &quiet()).unwrap(), ExitCode::Success);

    let graph: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(dir.path().join("graph-data.json")).unwrap())
            .unwrap();
    assert_eq!(graph["metadata"]["total_events"], 4);
    assert_eq!(graph["metadata"]["day"], 21);
    assert_eq!(graph["metadata"]["generated"], "2025-04-02");
    assert_eq!(graph["nodes"][0]["id"], "Claude Opus");

    let code = execute_validate(dir.path(), None, None, OutputFormat::Text, &quiet()).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_rebuild_is_byte_identical() {
    let dir = project(village_log());
    let output = dir.path().join("graph-data.json");

    build(dir.path(), &quiet()).unwrap();
    let first = std::fs::read(&output).unwrap();
    build(dir.path(), &quiet()).unwrap();
    let second = std::fs::read(&output).unwrap();

    assert_eq!(first, second);
}

#[test]
fn test_failed_build_leaves_existing_output_untouched() {
    let dir = project(json!({
        "metadata": {"total_events": 4, "last_updated_day": 21},
        "events": {"not": "a list"}
    }));
    let output = dir.path().join("graph-data.json");
    std::fs::write(&output, "previous artifact\n").unwrap();

    let err = build(dir.path(), &quiet()).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::InvalidInput);
    assert_eq!(std::fs::read_to_string(&output).unwrap(), "previous artifact\n");
}

#[test]
fn test_failed_build_writes_nothing() {
    let dir = project(json!({
        "metadata": {"last_updated_day": 21},
        "events": [{"agents": ["A", "B"]}]
    }));

    let err = build(dir.path(), &quiet()).unwrap_err();
    assert!(err.to_string().contains("total_events"));
    assert!(!dir.path().join("graph-data.json").exists());
}

#[test]
fn test_missing_event_log() {
    let dir = tempfile::tempdir().unwrap();
    let err = build(dir.path(), &quiet()).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::FileError);
}

#[test]
fn test_validate_reports_tampered_artifact() {
    let dir = project(village_log());
    build(dir.path(), &quiet()).unwrap();

    let path = dir.path().join("graph-data.json");
    let mut graph: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    graph["metadata"]["total_collaborations"] = json!(99);
    graph["nodes"][1]["id"] = graph["nodes"][0]["id"].clone();
    std::fs::write(&path, serde_json::to_string_pretty(&graph).unwrap()).unwrap();

    for format in [OutputFormat::Text, OutputFormat::Json, OutputFormat::Yaml] {
        let code = execute_validate(dir.path(), None, None, format, &quiet()).unwrap();
        assert_eq!(code, ExitCode::ValidationFailed);
    }
}

#[test]
fn test_validate_schema_violation() {
    let dir = project(village_log());
    std::fs::write(
        dir.path().join("graph-data.json"),
        json!({"metadata": {}, "nodes": [], "links": [], "extra": 1}).to_string(),
    )
    .unwrap();

    let code = execute_validate(dir.path(), None, None, OutputFormat::Text, &quiet()).unwrap();
    assert_eq!(code, ExitCode::ValidationFailed);
}

#[test]
fn test_validate_missing_schema() {
    let dir = project(village_log());
    build(dir.path(), &quiet()).unwrap();
    std::fs::remove_file(dir.path().join("schema/graph-data.schema.json")).unwrap();

    let err = execute_validate(dir.path(), None, None, OutputFormat::Text, &quiet()).unwrap_err();
    assert!(err.to_string().contains("Missing schema file"));
}

#[test]
fn test_roster_configuration() {
    let dir = project(json!({
        "metadata": {"total_events": 3, "last_updated_day": 9},
        "events": [
            {"agents": ["claude-opus@agentvillage.org", "gpt-4o@agentvillage.org", "visitor"]},
            {"agents": ["Claude Opus", "claude-opus@agentvillage.org", "o3@agentvillage.org"]},
            {"agents": ["all"]}
        ]
    }));
    let options = GlobalOptions {
        quiet: true,
        config: Some(repo_file("config/roster.example.toml")),
    };

    build(dir.path(), &options).unwrap();

    let graph: serde_json::Value = serde_json::from_str(
        &std::fs::read_to_string(dir.path().join("graph-data.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(
        graph["nodes"][0],
        json!({"id": "Claude Opus", "events": 2, "family": "claude"})
    );
    assert_eq!(graph["metadata"]["total_agents"], 3);
    assert!(graph["nodes"]
        .as_array()
        .unwrap()
        .iter()
        .all(|n| n["id"] != "visitor"));

    let code = execute_validate(dir.path(), None, None, OutputFormat::Text, &options).unwrap();
    assert_eq!(code, ExitCode::Success);
}

#[test]
fn test_invalid_configuration() {
    let dir = project(village_log());
    let config = dir.path().join("broken.toml");
    std::fs::write(&config, "[normalization]\npolicy = \"allow_list\"\nagents = []\n").unwrap();
    let options = GlobalOptions {
        quiet: true,
        config: Some(config),
    };

    let err = build(dir.path(), &options).unwrap_err();
    assert_eq!(ExitCode::from_error(&err), ExitCode::SchemaError);
}
