//! Output formatting for validation reports
//!
//! Text output follows the conventional layout: every violation on its own
//! line on stderr when validation fails, a one-line confirmation on stdout
//! when it passes. JSON and YAML print the full report to stdout.

use clap::ValueEnum;
use colored::Colorize;
use serde::Serialize;
use std::path::Path;

use collab_graph_core::{GraphError, ValidationReport};

/// Output format options for CLI results
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Default)]
pub enum OutputFormat {
    /// Human-readable lines
    #[default]
    Text,
    /// JSON format for machine processing
    Json,
    /// YAML format
    Yaml,
}

/// Validation report together with the artifact it describes
#[derive(Debug, Clone, Serialize)]
pub struct ReportOutput {
    pub file: String,
    #[serde(flatten)]
    pub report: ValidationReport,
}

impl ReportOutput {
    pub fn new(path: &Path, report: ValidationReport) -> Self {
        let file = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        Self { file, report }
    }

    /// Render output in the specified format
    pub fn render(&self, format: OutputFormat, quiet: bool) -> Result<(), GraphError> {
        match format {
            OutputFormat::Text => {
                self.render_text(quiet);
                Ok(())
            }
            OutputFormat::Json => {
                println!("{}", self.to_json()?);
                Ok(())
            }
            OutputFormat::Yaml => {
                print!("{}", self.to_yaml()?);
                Ok(())
            }
        }
    }

    /// Lines written to stderr for a failed validation
    pub fn failure_lines(&self) -> Vec<String> {
        self.report
            .violations
            .iter()
            .map(|v| format!("- {}", v))
            .collect()
    }

    /// Line written to stdout for a passed validation
    pub fn success_line(&self) -> String {
        format!("{} is valid.", self.file)
    }

    pub fn to_json(&self) -> Result<String, GraphError> {
        serde_json::to_string_pretty(self)
            .map_err(|e| GraphError::SerializationError(e.to_string()))
    }

    pub fn to_yaml(&self) -> Result<String, GraphError> {
        serde_yaml::to_string(self).map_err(|e| GraphError::SerializationError(e.to_string()))
    }

    fn render_text(&self, quiet: bool) {
        if self.report.is_valid() {
            if !quiet {
                println!("{}", self.success_line().green());
            }
            return;
        }

        eprintln!("{}", "Validation failed:".red().bold());
        for line in self.failure_lines() {
            eprintln!("{}", line);
        }
    }
}
