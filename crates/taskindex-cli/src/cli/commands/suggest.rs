//! Implementation of `taskindex suggest`.

use std::process::ExitCode;

use taskindex::{InMemoryTaskList, suggest};

use crate::cli::{args::SuggestCommand, context::load_tasks, output::output_suggestions};

/// Prints completions for the text at the cursor.
pub fn run(cmd: &SuggestCommand) -> ExitCode {
    let tasks = match &cmd.tasks {
        Some(path) => match load_tasks(path) {
            Ok(tasks) => tasks,
            Err(code) => return code,
        },
        None => InMemoryTaskList::new(),
    };

    let cursor = cmd.cursor.unwrap_or(cmd.text.len());
    output_suggestions(&suggest(&tasks, &cmd.text, cursor), cmd.json)
}
