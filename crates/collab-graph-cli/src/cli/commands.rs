//! CLI command definitions for building and validating collaboration graphs

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

use collab_graph_core::{
    build_graph, io, parse_generated_date, validate_graph, GraphConfig, GraphError, GRAPH_FILE,
    SCHEMA_FILE,
};

use super::output::{OutputFormat, ReportOutput};
use super::ExitCode;

/// Environment variable naming a configuration file
pub const CONFIG_ENV: &str = "COLLAB_GRAPH_CONFIG";

/// Collaboration graph CLI
///
/// Build the collaboration graph from a village event log and validate the
/// generated artifact against its schema and logical invariants.
#[derive(Parser, Debug)]
#[command(name = "collab-graph")]
#[command(about = "Build and validate village collaboration graphs", long_about = None)]
#[command(version)]
pub struct GraphCli {
    /// Output verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file (TOML, YAML or JSON)
    ///
    /// Defaults to collab-graph.toml in the working root when present.
    #[arg(long, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: GraphCommands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum GraphCommands {
    /// Generate graph-data.json from an event log
    Build {
        /// Path to the event log (events.json)
        #[arg(long, default_value = "../village-event-log/events.json")]
        events: PathBuf,

        /// Output path for the graph artifact
        #[arg(long, default_value = GRAPH_FILE)]
        output: PathBuf,

        /// Override the generated date (YYYY-MM-DD, default: today)
        #[arg(long)]
        generated: Option<String>,
    },

    /// Validate graph-data.json against its schema and invariants
    Validate {
        /// Project root holding graph-data.json and schema/
        #[arg(long, default_value = ".")]
        root: PathBuf,

        /// Graph artifact to validate (default: <root>/graph-data.json)
        #[arg(long)]
        data: Option<PathBuf>,

        /// Schema descriptor (default: <root>/schema/graph-data.schema.json)
        #[arg(long)]
        schema: Option<PathBuf>,

        /// Output format for the validation report
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },
}

/// Options shared by every command
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub quiet: bool,
    pub config: Option<PathBuf>,
}

/// Execute the build command
pub fn execute_build(
    events: &Path,
    output: &Path,
    generated: Option<&str>,
    options: &GlobalOptions,
) -> Result<ExitCode, GraphError> {
    let generated = generated.map(parse_generated_date).transpose()?;
    let config = GraphConfig::load(options.config.as_deref(), Path::new("."))?;

    let log = io::load_event_log(events)?;
    let graph = build_graph(&log, &config, generated)?;
    io::write_graph(&graph, output)?;

    if !options.quiet {
        println!("Wrote graph data to {}", output.display());
    }
    Ok(ExitCode::Success)
}

/// Execute the validate command
pub fn execute_validate(
    root: &Path,
    data: Option<&Path>,
    schema: Option<&Path>,
    format: OutputFormat,
    options: &GlobalOptions,
) -> Result<ExitCode, GraphError> {
    let data_path = data.map(Path::to_path_buf).unwrap_or_else(|| root.join(GRAPH_FILE));
    let schema_path = schema
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.join(SCHEMA_FILE));

    if !data_path.exists() {
        return Err(GraphError::file_error(format!(
            "Missing data file: {}",
            data_path.display()
        )));
    }
    if !schema_path.exists() {
        return Err(GraphError::file_error(format!(
            "Missing schema file: {}",
            schema_path.display()
        )));
    }

    let config = GraphConfig::load(options.config.as_deref(), root)?;
    let document = io::read_json(&data_path)?;
    let schema = io::read_json(&schema_path)?;

    let report = validate_graph(&document, &schema, &config)?;
    tracing::info!(
        path = %data_path.display(),
        violations = report.violations.len(),
        "Validated graph artifact"
    );

    let output = ReportOutput::new(&data_path, report);
    output.render(format, options.quiet)?;

    Ok(ExitCode::from_validation_result(!output.report.is_valid()))
}
