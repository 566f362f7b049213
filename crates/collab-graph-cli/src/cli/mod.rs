//! CLI module for the collaboration graph tool
//!
//! Provides the `build` and `validate` commands and maps their outcomes to
//! process exit codes.

pub mod commands;
pub mod output;

pub use commands::{GlobalOptions, GraphCli, GraphCommands};
pub use output::{OutputFormat, ReportOutput};

use collab_graph_core::GraphError;

/// Exit codes for CLI operations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ExitCode {
    /// Successful execution
    Success = 0,
    /// The graph artifact has violations
    ValidationFailed = 1,
    /// Invalid input document or arguments
    InvalidInput = 3,
    /// File not found or inaccessible
    FileError = 4,
    /// Schema descriptor or configuration errors
    SchemaError = 5,
    /// Internal error
    InternalError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> Self {
        code as i32
    }
}

impl ExitCode {
    /// Determine exit code from a validation outcome
    pub fn from_validation_result(has_violations: bool) -> Self {
        if has_violations {
            ExitCode::ValidationFailed
        } else {
            ExitCode::Success
        }
    }

    /// Exit code for a fatal error
    pub fn from_error(err: &GraphError) -> Self {
        match err {
            GraphError::InputFormat(_) | GraphError::ParseError(_) => ExitCode::InvalidInput,
            GraphError::FileError(_) => ExitCode::FileError,
            GraphError::SchemaError(_) | GraphError::ConfigError(_) => ExitCode::SchemaError,
            GraphError::SerializationError(_) => ExitCode::InternalError,
        }
    }
}

/// Run the CLI with the given arguments and return the exit code
pub fn run(cli: GraphCli) -> Result<ExitCode, GraphError> {
    let options = GlobalOptions {
        quiet: cli.quiet,
        config: cli.config,
    };

    match cli.command {
        GraphCommands::Build {
            events,
            output,
            generated,
        } => commands::execute_build(&events, &output, generated.as_deref(), &options),
        GraphCommands::Validate {
            root,
            data,
            schema,
            format,
        } => commands::execute_validate(
            &root,
            data.as_deref(),
            schema.as_deref(),
            format,
            &options,
        ),
    }
}
