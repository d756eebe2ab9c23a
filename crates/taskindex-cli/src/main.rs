//! Command-line interface for the task list index.

use std::{io, process::ExitCode};

use clap::Parser;
use taskindex_cli::cli::{CommandContext, args::Cli, commands};
use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter.
const LOG_ENV: &str = "TASKINDEX_LOG";

/// Sends log output to stderr, filtered by `TASKINDEX_LOG` (default `warn`).
fn init_logging() {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    let ctx = match CommandContext::load() {
        Ok(ctx) => ctx,
        Err(code) => return code,
    };
    commands::run(cli.command, &ctx)
}
