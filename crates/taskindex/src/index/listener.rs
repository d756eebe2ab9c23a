//! Turns task list notifications into queued index changes.

use std::sync::Weak;

use super::Inner;
use crate::{
    maintenance::PendingChange,
    task::{ContainerDelta, ContainerElement, DeltaKind, Task, TaskChangeListener, TaskData},
};

/// Listener registered with the repository on behalf of an index.
///
/// Holds the index weakly: the repository owns the listener, and the index
/// must not be kept alive by it.
pub struct IndexListener {
    /// The index being maintained.
    inner: Weak<Inner>,
}

impl IndexListener {
    /// Creates a listener for an index.
    pub fn new(inner: Weak<Inner>) -> Self {
        Self { inner }
    }

    /// Queues one change per `(task, change)` pair and schedules a run.
    fn submit(&self, changes: impl IntoIterator<Item = (String, PendingChange)>) {
        let Some(inner) = self.inner.upgrade() else {
            return;
        };
        if inner.is_closed() {
            return;
        }
        let mut queued = false;
        for (handle, change) in changes {
            inner.maintainer.enqueue(handle, change);
            queued = true;
        }
        if queued {
            inner.schedule_reindex();
        }
    }

    /// A data-carrying update for one task.
    fn update(&self, task: &Task, data: Option<&TaskData>) {
        self.submit([(
            task.handle.clone(),
            PendingChange::Update {
                task: task.clone(),
                data: data.cloned(),
            },
        )]);
    }
}

impl TaskChangeListener for IndexListener {
    fn task_data_updated(&self, task: &Task, data: Option<&TaskData>) {
        self.update(task, data);
    }

    fn edits_discarded(&self, task: &Task, data: Option<&TaskData>) {
        self.update(task, data);
    }

    fn containers_changed(&self, deltas: &[ContainerDelta]) {
        // Repository tasks are re-indexed through task_data_updated.
        let changes = deltas.iter().filter_map(|delta| match &delta.element {
            ContainerElement::Task(task) if task.is_local() => {
                let change = match delta.kind {
                    DeltaKind::Removed => PendingChange::Remove,
                    DeltaKind::Added | DeltaKind::ContentChanged => PendingChange::Update {
                        task: task.clone(),
                        data: None,
                    },
                };
                Some((task.handle.clone(), change))
            }
            _ => None,
        });
        self.submit(changes);
    }
}
