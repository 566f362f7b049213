//! Reading input documents and writing the graph artifact
//!
//! The artifact is checked into version control and diffed across runs, so it
//! is rendered deterministically (struct field order, two-space indentation,
//! trailing newline) and replaced atomically.

use serde_json::Value;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

use crate::error::{GraphError, Result};
use crate::model::{EventLog, Graph};

/// Read and parse a JSON document
pub fn read_json(path: &Path) -> Result<Value> {
    if !path.exists() {
        return Err(GraphError::file_error(format!(
            "{} not found at {}",
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| "file".to_string()),
            path.display()
        )));
    }

    let content = std::fs::read_to_string(path).map_err(|e| {
        GraphError::file_error(format!("Failed to read '{}': {}", path.display(), e))
    })?;

    serde_json::from_str(&content).map_err(|e| {
        GraphError::parse_error(format!("Invalid JSON in '{}': {}", path.display(), e))
    })
}

/// Load an event log
pub fn load_event_log(path: &Path) -> Result<EventLog> {
    let log = EventLog::from_value(read_json(path)?)?;
    tracing::debug!(path = %path.display(), events = log.events.len(), "Loaded event log");
    Ok(log)
}

/// Render a graph exactly as it is written to disk
pub fn render_graph(graph: &Graph) -> Result<String> {
    let mut rendered = serde_json::to_string_pretty(graph)
        .map_err(|e| GraphError::SerializationError(e.to_string()))?;
    rendered.push('\n');
    Ok(rendered)
}

/// Write a graph, replacing any existing file only once the new content is complete
pub fn write_graph(graph: &Graph, path: &Path) -> Result<()> {
    let rendered = render_graph(graph)?;

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent).map_err(|e| {
        GraphError::file_error(format!(
            "Failed to create directory '{}': {}",
            parent.display(),
            e
        ))
    })?;

    let mut staged = NamedTempFile::new_in(parent).map_err(|e| {
        GraphError::file_error(format!(
            "Failed to stage output in '{}': {}",
            parent.display(),
            e
        ))
    })?;
    staged.write_all(rendered.as_bytes())?;
    staged.flush()?;
    staged.persist(path).map_err(|e| {
        GraphError::file_error(format!("Failed to write '{}': {}", path.display(), e.error))
    })?;

    tracing::debug!(path = %path.display(), bytes = rendered.len(), "Wrote graph artifact");
    Ok(())
}
