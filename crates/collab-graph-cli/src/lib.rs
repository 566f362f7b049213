//! Collaboration Graph CLI
//!
//! Command-line front end over `collab-graph-core`.
//!
//! ```bash
//! # Generate graph-data.json from the sibling event log checkout
//! collab-graph build --events ../village-event-log/events.json --output graph-data.json
//!
//! # Pin the generated date for reproducible output
//! collab-graph build --generated 2025-04-02
//!
//! # Validate ./graph-data.json against ./schema/graph-data.schema.json
//! collab-graph validate
//! ```
//!
//! # Exit Codes
//!
//! - 0: Success
//! - 1: Validation failed
//! - 3: Invalid input document or arguments
//! - 4: File not found or inaccessible
//! - 5: Schema descriptor or configuration error
//! - 10: Internal error

pub mod cli;

pub use cli::{ExitCode, GraphCli, GraphCommands, OutputFormat};

/// Run the CLI application, printing fatal errors to stderr
pub fn run_cli(cli: GraphCli) -> ExitCode {
    match cli::run(cli) {
        Ok(code) => code,
        Err(e) => {
            if e.is_user_error() {
                tracing::debug!(error = ?e, "Command failed");
            } else {
                tracing::error!(error = ?e, "Command failed unexpectedly");
            }
            eprintln!("Error: {}", e);
            ExitCode::from_error(&e)
        }
    }
}
