//! Incremental full-text index over a task list.
//!
//! The index answers two questions with low latency while the task list is
//! edited, synchronized and reloaded underneath it:
//! - does this task match this pattern ([`TaskListIndex::matches`])
//! - which tasks match this pattern ([`TaskListIndex::find`])
//!
//! Tasks are read through a [`TaskRepository`]. The index subscribes to its
//! change notifications, queues the affected tasks, and applies them on a
//! background worker after a short delay. A store that is missing or cannot
//! be read is rebuilt from every task in the repository.
//!
//! Patterns use a small query language: bare words match as prefixes,
//! `"quoted phrases"` match exactly, `field:term` qualifies a word, and
//! `AND`, `OR`, `NOT`, `-` and parentheses combine terms. Date fields take
//! ranges such as `creation_date:[20240101 TO 20240131]`.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use taskindex::{InMemoryTaskList, IndexOptions, Task, TaskListIndex};
//!
//! let tasks = Arc::new(InMemoryTaskList::new());
//! tasks.add_task(Task::local("local-1", "Fix the release script"));
//!
//! let index = TaskListIndex::in_memory(tasks.clone(), IndexOptions::synchronous()).unwrap();
//! index.find("release", |task| println!("{}", task.summary), 10);
//! ```

#![warn(missing_docs)]

mod analyzer;
mod document;
mod error;
mod field;
mod index;
mod maintenance;
mod memory;
mod query;
mod schema;
mod snapshot;
mod store;
mod suggest;
mod task;

pub use analyzer::TASK_TOKENIZER;
pub use document::{DATE_FORMAT, TaskDocument, format_date};
pub use error::IndexError;
pub use field::TaskField;
pub use index::{
    DEFAULT_CLOSE_TIMEOUT, DEFAULT_MAX_MATCH_HITS, DEFAULT_REINDEX_DELAY, DEFAULT_STARTUP_DELAY,
    IndexOptions, MAX_STARTUP_DELAY, RESET_COMMAND, TaskListIndex,
};
pub use maintenance::{MaintenanceState, MaintenanceStats, Maintainer, PendingChange};
pub use memory::{InMemoryTaskList, TaskEntry};
pub use query::{QueryError, QueryExpr, QueryTranslator, parse as parse_query};
pub use schema::IndexSchema;
pub use snapshot::{SearchHit, Snapshot, SnapshotCache};
pub use store::{IndexStore, StoreLocation, StoreWriter};
pub use suggest::{Suggestion, suggest};
pub use task::{
    ContainerDelta, ContainerElement, DeltaKind, LOCAL_CONNECTOR_KIND, ListenerId, Task,
    TaskAttribute, TaskChangeListener, TaskData, TaskDataError, TaskRepository, attribute,
};
