//! Rendering and JSON serialization for CLI output.

use std::process::ExitCode;

use comfy_table::{Cell, Table, presets::UTF8_FULL_CONDENSED};
use serde::Serialize;
use taskindex::{Suggestion, Task};

use super::context::error_exit;

/// Longest summary shown in a table cell.
const SUMMARY_WIDTH: usize = 60;

/// JSON form of a completion proposal.
#[derive(Serialize)]
struct JsonSuggestion<'a> {
    /// Text to insert at the cursor.
    completion: &'a str,
    /// Full proposed word.
    label: &'a str,
    /// What the proposal searches.
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
}

/// JSON output for `search`.
#[derive(Serialize)]
struct JsonSearchOutput<'a> {
    /// The pattern searched.
    pattern: &'a str,
    /// Matching tasks, best first.
    tasks: &'a [Task],
    /// Number of tasks returned.
    total_matches: usize,
}

/// Prints a value as pretty JSON.
fn print_json<T: Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("error: failed to serialize JSON: {e}");
            error_exit()
        }
    }
}

/// Shortens `text` to `width` characters, marking the cut.
fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('…');
    cut
}

/// Renders search results as a table.
pub fn task_table(tasks: &[Task]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_header(vec!["Handle", "Key", "Summary", "Created"]);
    for task in tasks {
        let created = task
            .creation_date
            .map(|date| date.format("%Y-%m-%d").to_string())
            .unwrap_or_default();
        table.add_row(vec![
            Cell::new(&task.handle),
            Cell::new(task.task_key.as_deref().unwrap_or("")),
            Cell::new(truncate(&task.summary, SUMMARY_WIDTH)),
            Cell::new(created),
        ]);
    }
    table
}

/// Outputs search results as a table or JSON.
pub fn output_tasks(pattern: &str, tasks: &[Task], json: bool) -> ExitCode {
    if json {
        return print_json(&JsonSearchOutput {
            pattern,
            tasks,
            total_matches: tasks.len(),
        });
    }
    if tasks.is_empty() {
        println!("No matching tasks.");
        return ExitCode::SUCCESS;
    }
    println!("{}", task_table(tasks));
    ExitCode::SUCCESS
}

/// Outputs completion proposals, one per line or as JSON.
pub fn output_suggestions(suggestions: &[Suggestion], json: bool) -> ExitCode {
    if json {
        let items: Vec<_> = suggestions
            .iter()
            .map(|s| JsonSuggestion {
                completion: &s.completion,
                label: &s.label,
                description: s.description.as_deref(),
            })
            .collect();
        return print_json(&items);
    }
    for suggestion in suggestions {
        match &suggestion.description {
            Some(description) => println!("{}\t{description}", suggestion.label),
            None => println!("{}", suggestion.label),
        }
    }
    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_marks_cut() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("abcdefghij", 5), "abcd…");
    }

    #[test]
    fn table_lists_each_task() {
        let mut task = Task::local("local-1", "Write the changelog");
        task.task_key = Some("7".into());
        let rendered = task_table(&[task]).to_string();
        assert!(rendered.contains("local-1"));
        assert!(rendered.contains("Write the changelog"));
        assert!(rendered.contains("Summary"));
    }
}
