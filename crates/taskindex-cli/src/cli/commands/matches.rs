//! Implementation of `taskindex matches`.

use std::process::ExitCode;

use taskindex::TaskRepository;

use crate::cli::{
    args::MatchesCommand,
    context::{CommandContext, error_exit},
};

/// Exits 0 if the task matches the pattern and 1 if it does not.
pub fn run(ctx: &CommandContext, cmd: &MatchesCommand) -> ExitCode {
    let opened = match ctx.open_index(&cmd.index) {
        Ok(opened) => opened,
        Err(code) => return code,
    };

    let Some(task) = opened.tasks.task_by_handle(&cmd.handle) else {
        eprintln!("error: no task with handle '{}'", cmd.handle);
        return error_exit();
    };

    if opened.index.matches(&task, &cmd.pattern) {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
