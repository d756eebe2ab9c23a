//! A repository that holds a maintenance run inside `task_data`.

use std::sync::Arc;

use parking_lot::{Condvar, Mutex};

use crate::{
    memory::InMemoryTaskList,
    task::{ListenerId, Task, TaskChangeListener, TaskData, TaskDataError, TaskRepository},
};

/// Gate position.
#[derive(Default)]
struct GateState {
    /// A fetch reached the gate.
    entered: bool,
    /// Fetches may pass.
    open: bool,
}

/// Wraps a task list; the first `task_data` call blocks until released.
pub struct GatedTasks {
    /// Tasks served once the gate opens.
    list: InMemoryTaskList,
    /// Gate position.
    state: Mutex<GateState>,
    /// Signalled when the gate changes.
    changed: Condvar,
}

impl GatedTasks {
    /// Gates a list holding `count` local tasks.
    pub fn with_tasks(count: usize) -> Arc<Self> {
        let list = InMemoryTaskList::new();
        for i in 0..count {
            list.add_task(Task::local(format!("local-{i}"), format!("task {i}")));
        }
        Arc::new(Self {
            list,
            state: Mutex::new(GateState::default()),
            changed: Condvar::new(),
        })
    }

    /// Blocks until a run is held at the gate.
    pub fn wait_entered(&self) {
        let mut state = self.state.lock();
        while !state.entered {
            self.changed.wait(&mut state);
        }
    }

    /// Lets every fetch through from now on.
    pub fn release(&self) {
        self.state.lock().open = true;
        self.changed.notify_all();
    }
}

impl TaskRepository for GatedTasks {
    fn all_tasks(&self) -> Vec<Task> {
        self.list.all_tasks()
    }

    fn task_by_handle(&self, handle: &str) -> Option<Task> {
        self.list.task_by_handle(handle)
    }

    fn task_data(&self, task: &Task) -> Result<Option<TaskData>, TaskDataError> {
        {
            let mut state = self.state.lock();
            state.entered = true;
            self.changed.notify_all();
            while !state.open {
                self.changed.wait(&mut state);
            }
        }
        self.list.task_data(task)
    }

    fn add_listener(&self, listener: Arc<dyn TaskChangeListener>) -> ListenerId {
        self.list.add_listener(listener)
    }

    fn remove_listener(&self, id: ListenerId) {
        self.list.remove_listener(id);
    }
}
