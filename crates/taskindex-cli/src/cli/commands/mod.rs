//! Command implementations and dispatch.

pub mod fields;
pub mod matches;
pub mod search;
pub mod status;
pub mod suggest;

use std::process::ExitCode;

use super::{args::Commands, context::CommandContext};

/// Dispatches to the selected subcommand.
pub fn run(command: Commands, ctx: &CommandContext) -> ExitCode {
    match command {
        Commands::Search(cmd) => search::run(ctx, &cmd),
        Commands::Matches(cmd) => matches::run(ctx, &cmd),
        Commands::Fields => fields::run(),
        Commands::Suggest(cmd) => suggest::run(&cmd),
        Commands::Status => status::run(ctx),
    }
}
