//! Shared context for running CLI commands.

use std::{
    env, fs,
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
    time::Duration,
};

use taskindex::{InMemoryTaskList, IndexOptions, StoreLocation, TaskListIndex};
use taskindex_config::Config;
use tracing::debug;

use super::args::IndexArgs;

/// Exit code for errors, distinct from a `matches` miss.
pub fn error_exit() -> ExitCode {
    ExitCode::from(2)
}

/// Command execution context built once per CLI invocation.
pub struct CommandContext {
    /// Current working directory.
    pub cwd: PathBuf,
    /// Loaded configuration (may be default if no config files found).
    pub config: Config,
}

/// An index opened over a task file.
pub struct OpenIndex {
    /// The loaded tasks.
    pub tasks: Arc<InMemoryTaskList>,
    /// Index over them, fully built.
    pub index: TaskListIndex,
}

impl CommandContext {
    /// Loads the current directory and configuration.
    pub fn load() -> Result<Self, ExitCode> {
        let cwd = env::current_dir().map_err(|e| {
            eprintln!("error: could not determine current directory: {e}");
            error_exit()
        })?;
        let config = Config::load(&cwd).map_err(|e| {
            eprintln!("error: failed to load configuration: {e}");
            error_exit()
        })?;
        Ok(Self { cwd, config })
    }

    /// Index options from configuration, with command-line overrides applied.
    ///
    /// Both delays are zero: the process exits after one command, so every
    /// maintenance run happens before the command reads the index.
    fn index_options(&self, args: &IndexArgs) -> Result<IndexOptions, ExitCode> {
        let mut options = IndexOptions::from_config(&self.config).map_err(|e| {
            eprintln!("error: invalid index configuration: {e}");
            error_exit()
        })?;
        if let Some(field) = args.field {
            options.default_field = field;
        }
        Ok(options
            .with_startup_delay(Duration::ZERO)
            .with_reindex_delay(Duration::ZERO))
    }

    /// Store location: `--index`, then the configured location, then memory.
    fn store_location(&self, args: &IndexArgs) -> StoreLocation {
        args.index
            .clone()
            .or_else(|| self.config.index.location.clone())
            .map_or(StoreLocation::InMemory, StoreLocation::Directory)
    }

    /// Loads the task file and opens an index over it.
    pub fn open_index(&self, args: &IndexArgs) -> Result<OpenIndex, ExitCode> {
        let tasks = Arc::new(load_tasks(&args.tasks)?);
        let options = self.index_options(args)?;
        let location = self.store_location(args);
        debug!(%location, tasks = tasks.len(), "opening task index");

        let index = TaskListIndex::open(tasks.clone(), location, options).map_err(|e| {
            eprintln!("error: failed to open index: {e}");
            error_exit()
        })?;
        if args.reindex {
            index.reindex();
        }
        index.wait_until_idle();
        Ok(OpenIndex { tasks, index })
    }
}

/// Reads a JSON task file into an in-memory task list.
pub fn load_tasks(path: &Path) -> Result<InMemoryTaskList, ExitCode> {
    let contents = fs::read_to_string(path).map_err(|e| {
        eprintln!("error: failed to read {}: {e}", path.display());
        error_exit()
    })?;
    InMemoryTaskList::from_json(&contents).map_err(|e| {
        eprintln!("error: invalid task file {}: {e}", path.display());
        error_exit()
    })
}
