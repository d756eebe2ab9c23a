//! A thread-safe task list held in memory.
//!
//! Used by the command-line tool and by tests. Every mutation notifies the
//! registered listeners after the list's own lock has been released, so a
//! listener may call back into the list.

use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        Arc,
        atomic::{AtomicU64, Ordering},
    },
};

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};

use crate::task::{
    ContainerDelta, DeltaKind, ListenerId, Task, TaskChangeListener, TaskData, TaskDataError,
    TaskRepository,
};

/// One task with its optional repository data, as stored in task files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskEntry {
    /// The task.
    pub task: Task,
    /// Repository data, absent for local tasks.
    #[serde(default)]
    pub data: Option<TaskData>,
}

/// Tasks and their data.
#[derive(Default)]
struct Tasks {
    /// Tasks by handle.
    tasks: BTreeMap<String, Task>,
    /// Repository data by handle.
    data: HashMap<String, TaskData>,
    /// Handles whose data fetch fails.
    failing: HashSet<String>,
}

/// In-memory [`TaskRepository`].
#[derive(Default)]
pub struct InMemoryTaskList {
    /// Tasks and data.
    tasks: RwLock<Tasks>,
    /// Registered listeners.
    listeners: Mutex<Vec<(ListenerId, Arc<dyn TaskChangeListener>)>>,
    /// Next listener id.
    next_listener: AtomicU64,
}

impl InMemoryTaskList {
    /// Creates an empty task list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a task list from entries without notifying anyone.
    pub fn from_entries(entries: impl IntoIterator<Item = TaskEntry>) -> Self {
        let list = Self::new();
        {
            let mut tasks = list.tasks.write();
            for TaskEntry { task, data } in entries {
                if let Some(data) = data {
                    tasks.data.insert(task.handle.clone(), data);
                }
                tasks.tasks.insert(task.handle.clone(), task);
            }
        }
        list
    }

    /// Parses a JSON array of [`TaskEntry`] values.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let entries: Vec<TaskEntry> = serde_json::from_str(json)?;
        Ok(Self::from_entries(entries))
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.read().tasks.len()
    }

    /// Whether the list holds no tasks.
    pub fn is_empty(&self) -> bool {
        self.tasks.read().tasks.is_empty()
    }

    /// Adds a task, replacing any task with the same handle.
    pub fn add_task(&self, task: Task) {
        self.tasks
            .write()
            .tasks
            .insert(task.handle.clone(), task.clone());
        self.notify_containers(&[ContainerDelta::task(DeltaKind::Added, task)]);
    }

    /// Replaces a task's built-in fields (summary, notes, dates).
    pub fn update_task(&self, task: Task) {
        self.tasks
            .write()
            .tasks
            .insert(task.handle.clone(), task.clone());
        self.notify_containers(&[ContainerDelta::task(DeltaKind::ContentChanged, task)]);
    }

    /// Removes a task and its data. Returns the removed task.
    pub fn remove_task(&self, handle: &str) -> Option<Task> {
        let removed = {
            let mut tasks = self.tasks.write();
            tasks.data.remove(handle);
            tasks.failing.remove(handle);
            tasks.tasks.remove(handle)
        };
        if let Some(task) = &removed {
            self.notify_containers(&[ContainerDelta::task(DeltaKind::Removed, task.clone())]);
        }
        removed
    }

    /// Stores repository data for a task, as after a synchronization.
    pub fn set_task_data(&self, handle: &str, data: TaskData) {
        let task = {
            let mut tasks = self.tasks.write();
            tasks.data.insert(handle.to_string(), data.clone());
            tasks.tasks.get(handle).cloned()
        };
        if let Some(task) = task {
            for listener in self.listeners() {
                listener.task_data_updated(&task, Some(&data));
            }
        }
    }

    /// Reports that local edits to a task were thrown away.
    pub fn discard_edits(&self, handle: &str) {
        let (task, data) = {
            let tasks = self.tasks.read();
            (tasks.tasks.get(handle).cloned(), tasks.data.get(handle).cloned())
        };
        if let Some(task) = task {
            for listener in self.listeners() {
                listener.edits_discarded(&task, data.as_ref());
            }
        }
    }

    /// Makes data fetches for a task fail (or succeed again).
    pub fn set_data_failure(&self, handle: &str, failing: bool) {
        let mut tasks = self.tasks.write();
        if failing {
            tasks.failing.insert(handle.to_string());
        } else {
            tasks.failing.remove(handle);
        }
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Snapshot of the registered listeners.
    fn listeners(&self) -> Vec<Arc<dyn TaskChangeListener>> {
        self.listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }

    /// Sends container deltas to every listener.
    fn notify_containers(&self, deltas: &[ContainerDelta]) {
        for listener in self.listeners() {
            listener.containers_changed(deltas);
        }
    }
}

impl TaskRepository for InMemoryTaskList {
    fn all_tasks(&self) -> Vec<Task> {
        self.tasks.read().tasks.values().cloned().collect()
    }

    fn task_by_handle(&self, handle: &str) -> Option<Task> {
        self.tasks.read().tasks.get(handle).cloned()
    }

    fn task_data(&self, task: &Task) -> Result<Option<TaskData>, TaskDataError> {
        let tasks = self.tasks.read();
        if tasks.failing.contains(&task.handle) {
            return Err(TaskDataError::new(&task.handle, "task data unavailable"));
        }
        Ok(tasks.data.get(&task.handle).cloned())
    }

    fn add_listener(&self, listener: Arc<dyn TaskChangeListener>) -> ListenerId {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, listener));
        id
    }

    fn remove_listener(&self, id: ListenerId) {
        self.listeners.lock().retain(|(existing, _)| *existing != id);
    }
}
