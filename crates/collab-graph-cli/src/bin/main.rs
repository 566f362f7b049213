//! collab-graph entry point

use clap::Parser;
use collab_graph_cli::{run_cli, GraphCli};
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = GraphCli::parse();

    // RUST_LOG wins over -v/-q
    let level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        }
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let exit_code = run_cli(cli);
    std::process::exit(exit_code.into());
}
