//! Clap argument definitions for the `taskindex` CLI.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use taskindex::TaskField;

/// Parse a field name, ignoring case.
fn parse_field(s: &str) -> Result<TaskField, String> {
    TaskField::from_name(s).ok_or_else(|| format!("unknown field '{s}'"))
}

/// Top-level CLI options.
#[derive(Parser)]
#[command(name = "taskindex")]
#[command(about = "Full-text search over task lists")]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Flags that select the tasks and the index to search.
#[derive(Args, Debug, Clone)]
pub struct IndexArgs {
    /// JSON file of tasks: [{"task": {...}, "data": {...}}]
    #[arg(long)]
    pub tasks: PathBuf,

    /// Field searched by unqualified words [default: from config, else summary]
    #[arg(long, value_parser = parse_field)]
    pub field: Option<TaskField>,

    /// Keep the index in this directory instead of in memory
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// Rebuild a persisted index before searching
    #[arg(long)]
    pub reindex: bool,
}

/// Arguments for `taskindex search`.
#[derive(Args, Debug, Clone)]
pub struct SearchCommand {
    /// Search pattern
    pub pattern: String,

    #[command(flatten)]
    /// Task and index selection.
    pub index: IndexArgs,

    /// Maximum tasks to list
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `taskindex matches`.
#[derive(Args, Debug, Clone)]
pub struct MatchesCommand {
    /// Handle of the task to test
    pub handle: String,

    /// Search pattern
    pub pattern: String,

    #[command(flatten)]
    /// Task and index selection.
    pub index: IndexArgs,
}

/// Arguments for `taskindex suggest`.
#[derive(Args, Debug, Clone)]
pub struct SuggestCommand {
    /// Pattern text being typed
    pub text: String,

    /// Cursor byte offset within the text [default: end of text]
    #[arg(long)]
    pub cursor: Option<usize>,

    /// JSON file of tasks, used to propose people
    #[arg(long)]
    pub tasks: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Supported `taskindex` subcommands.
#[derive(Subcommand)]
pub enum Commands {
    /// List tasks matching a pattern, best match first
    Search(SearchCommand),

    /// Exit 0 if a task matches a pattern, 1 if it does not
    Matches(MatchesCommand),

    /// List the fields patterns can name
    Fields,

    /// Propose completions for a pattern being typed
    Suggest(SuggestCommand),

    /// Show effective configuration and validation warnings
    Status,
}
