//! Task collaborator model.
//!
//! The index does not own tasks. It reads them through a [`TaskRepository`]
//! and learns about changes through [`TaskChangeListener`] callbacks.

use std::{error::Error as StdError, sync::Arc};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Connector kind of tasks that exist only in the local task list.
pub const LOCAL_CONNECTOR_KIND: &str = "local";

/// Well-known task attribute ids and kinds.
pub mod attribute {
    /// Summary attribute.
    pub const SUMMARY: &str = "task.common.summary";
    /// Description attribute.
    pub const DESCRIPTION: &str = "task.common.description";
    /// Assigned user.
    pub const USER_ASSIGNED: &str = "task.common.user.assigned";
    /// Reporting user.
    pub const USER_REPORTER: &str = "task.common.user.reporter";
    /// Component.
    pub const COMPONENT: &str = "task.common.component";
    /// Keywords.
    pub const KEYWORDS: &str = "task.common.keywords";
    /// Product.
    pub const PRODUCT: &str = "task.common.product";
    /// Resolution.
    pub const RESOLUTION: &str = "task.common.resolution";
    /// Severity.
    pub const SEVERITY: &str = "task.common.severity";
    /// Status.
    pub const STATUS: &str = "task.common.status";
    /// Free-form status whiteboard.
    pub const STATUS_WHITEBOARD: &str = "status_whiteboard";
    /// Comment body, a child of a comment attribute.
    pub const COMMENT_TEXT: &str = "task.common.comment.text";
    /// Comment author, a child of a comment attribute.
    pub const COMMENT_AUTHOR: &str = "task.common.comment.author";

    /// Kind of comment attributes.
    pub const KIND_COMMENT: &str = "comment";
    /// Kind of attributes whose values are person ids.
    pub const KIND_PERSON: &str = "person";
}

/// A task as held by the task list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Task {
    /// Unique, stable handle.
    pub handle: String,
    /// Connector that owns the task; [`LOCAL_CONNECTOR_KIND`] for local tasks.
    pub connector_kind: String,
    /// Human-facing key.
    pub task_key: Option<String>,
    /// One-line summary.
    pub summary: String,
    /// Private notes.
    pub notes: String,
    /// Owner person id.
    pub owner: Option<String>,
    /// When the task was created.
    pub creation_date: Option<DateTime<Utc>>,
    /// When the task was last modified.
    pub modification_date: Option<DateTime<Utc>>,
    /// When the task is due.
    pub due_date: Option<DateTime<Utc>>,
    /// When the task was completed.
    pub completion_date: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a local task with the given handle and summary.
    pub fn local(handle: impl Into<String>, summary: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            connector_kind: LOCAL_CONNECTOR_KIND.to_string(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Creates a task owned by a repository connector.
    pub fn repository(
        handle: impl Into<String>,
        connector_kind: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            handle: handle.into(),
            connector_kind: connector_kind.into(),
            summary: summary.into(),
            ..Self::default()
        }
    }

    /// Whether the task lives only in the local task list.
    pub fn is_local(&self) -> bool {
        self.connector_kind == LOCAL_CONNECTOR_KIND
    }
}

/// An attribute in a task's repository data.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskAttribute {
    /// Attribute id, e.g. [`attribute::STATUS`].
    pub id: String,
    /// Attribute kind, e.g. [`attribute::KIND_PERSON`].
    pub kind: Option<String>,
    /// Values, in order.
    pub values: Vec<String>,
    /// Nested attributes (comment text and author live here).
    pub children: Vec<Self>,
}

impl TaskAttribute {
    /// Creates a single-valued attribute.
    pub fn new(id: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            values: vec![value.into()],
            ..Self::default()
        }
    }

    /// Sets the kind.
    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    /// Creates a comment attribute with text and an optional author.
    pub fn comment(id: impl Into<String>, text: &str, author: Option<&str>) -> Self {
        let mut children = vec![Self::new(attribute::COMMENT_TEXT, text)];
        if let Some(author) = author {
            children.push(Self::new(attribute::COMMENT_AUTHOR, author));
        }
        Self {
            id: id.into(),
            kind: Some(attribute::KIND_COMMENT.to_string()),
            values: Vec::new(),
            children,
        }
    }

    /// First value, if any.
    pub fn value(&self) -> Option<&str> {
        self.values.first().map(String::as_str)
    }

    /// Direct child with the given id.
    pub fn child(&self, id: &str) -> Option<&Self> {
        self.children.iter().find(|c| c.id == id)
    }

    /// Whether the attribute has the given kind.
    fn is_kind(&self, kind: &str) -> bool {
        self.kind.as_deref() == Some(kind)
    }
}

/// Repository-side data for a task.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TaskData {
    /// Top-level attributes.
    pub attributes: Vec<TaskAttribute>,
}

impl TaskData {
    /// Creates task data from top-level attributes.
    pub fn new(attributes: Vec<TaskAttribute>) -> Self {
        Self { attributes }
    }

    /// Top-level attribute with the given id.
    pub fn attribute(&self, id: &str) -> Option<&TaskAttribute> {
        self.attributes.iter().find(|a| a.id == id)
    }

    /// Top-level attributes of the given kind, in order.
    pub fn attributes_of_kind<'a>(
        &'a self,
        kind: &'a str,
    ) -> impl Iterator<Item = &'a TaskAttribute> + 'a {
        self.attributes.iter().filter(move |a| a.is_kind(kind))
    }

    /// Comments as `(text, author)` pairs.
    pub fn comments(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.attributes_of_kind(attribute::KIND_COMMENT).map(|c| {
            let text = c
                .child(attribute::COMMENT_TEXT)
                .and_then(TaskAttribute::value)
                .unwrap_or("");
            let author = c
                .child(attribute::COMMENT_AUTHOR)
                .and_then(TaskAttribute::value);
            (text, author)
        })
    }
}

/// Failure to fetch one task's repository data.
#[derive(Debug, Error)]
#[error("failed to read task data for {handle}: {message}")]
pub struct TaskDataError {
    /// Handle of the task whose data could not be read.
    pub handle: String,
    /// Description of the failure.
    pub message: String,
    /// Underlying cause, when there is one.
    #[source]
    pub source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TaskDataError {
    /// Creates an error without an underlying cause.
    pub fn new(handle: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            handle: handle.into(),
            message: message.into(),
            source: None,
        }
    }
}

/// What happened to an element of a task container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeltaKind {
    /// Element was added.
    Added,
    /// Element was removed.
    Removed,
    /// Element content changed.
    ContentChanged,
}

/// Element a container delta refers to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerElement {
    /// A task.
    Task(Task),
    /// A container (category or query), identified by handle.
    Container(String),
}

/// A change to the task list's containers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerDelta {
    /// What happened.
    pub kind: DeltaKind,
    /// The affected element.
    pub element: ContainerElement,
}

impl ContainerDelta {
    /// Creates a delta for a task.
    pub fn task(kind: DeltaKind, task: Task) -> Self {
        Self {
            kind,
            element: ContainerElement::Task(task),
        }
    }
}

/// Receives task list change notifications.
pub trait TaskChangeListener: Send + Sync {
    /// Repository data for a task was saved or refreshed.
    fn task_data_updated(&self, task: &Task, data: Option<&TaskData>);

    /// Local edits to a task were discarded.
    fn edits_discarded(&self, task: &Task, data: Option<&TaskData>);

    /// Containers gained, lost or changed elements.
    fn containers_changed(&self, deltas: &[ContainerDelta]);
}

/// Token returned by [`TaskRepository::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Read access to the task list plus change subscription.
pub trait TaskRepository: Send + Sync {
    /// Snapshot of every task.
    fn all_tasks(&self) -> Vec<Task>;

    /// Looks a task up by handle.
    fn task_by_handle(&self, handle: &str) -> Option<Task>;

    /// Repository data for a task. `Ok(None)` means the task has none.
    fn task_data(&self, task: &Task) -> Result<Option<TaskData>, TaskDataError>;

    /// Subscribes a listener to task and container changes.
    fn add_listener(&self, listener: Arc<dyn TaskChangeListener>) -> ListenerId;

    /// Removes a previously added listener. Unknown ids are ignored.
    fn remove_listener(&self, id: ListenerId);
}
