//! Implementation of `taskindex search`.

use std::process::ExitCode;

use crate::cli::{args::SearchCommand, context::CommandContext, output::output_tasks};

/// Lists tasks matching the pattern, best match first.
pub fn run(ctx: &CommandContext, cmd: &SearchCommand) -> ExitCode {
    let opened = match ctx.open_index(&cmd.index) {
        Ok(opened) => opened,
        Err(code) => return code,
    };

    let mut tasks = Vec::new();
    opened
        .index
        .find(&cmd.pattern, |task| tasks.push(task), cmd.limit);
    output_tasks(&cmd.pattern, &tasks, cmd.json)
}
