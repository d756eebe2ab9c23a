//! Index maintenance: full rebuilds and incremental updates.
//!
//! [`Maintainer`] does the work of one run. [`Scheduler`] owns the background
//! worker that decides when runs happen.
//!
//! A run first checks that the store can be read. If it cannot, or a rebuild
//! was requested, the store is truncated and rebuilt from every task in the
//! repository. The run then drains the pending-change queue, batch by batch,
//! until it is empty.

mod scheduler;
#[cfg(test)]
mod test_support;

use std::{
    collections::HashMap,
    fmt, mem,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};

use parking_lot::Mutex;
use tracing::{debug, info, warn};

pub use self::scheduler::{Scheduler, Trigger};
use crate::{
    document::TaskDocument,
    error::IndexError,
    snapshot::SnapshotCache,
    store::{IndexStore, StoreLocation, StoreWriter},
    task::{Task, TaskData, TaskRepository},
};

/// Tasks processed between cancellation checks during a rebuild.
const CANCEL_CHECK_INTERVAL: usize = 256;

/// Where the maintenance task is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaintenanceState {
    /// Nothing scheduled or running.
    Idle,
    /// The first run after opening is waiting for the startup delay.
    ScheduledStartup,
    /// A run is waiting for the reindex delay.
    ScheduledReindex,
    /// The store is being rebuilt from every task.
    RunningFullRebuild,
    /// Queued changes are being applied.
    RunningIncrementalUpdate,
}

impl fmt::Display for MaintenanceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::ScheduledStartup => "scheduled (startup)",
            Self::ScheduledReindex => "scheduled (reindex)",
            Self::RunningFullRebuild => "rebuilding",
            Self::RunningIncrementalUpdate => "updating",
        })
    }
}

/// A queued change for one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PendingChange {
    /// Re-index the task from this snapshot of its data. `None` derives the
    /// document from the task's own fields, which only local tasks support.
    Update {
        /// The task as of the notification.
        task: Task,
        /// Its repository data as of the notification.
        data: Option<TaskData>,
    },
    /// Delete the task's document.
    Remove,
}

/// Counters for one maintenance run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MaintenanceStats {
    /// Whether the run rebuilt the store.
    pub rebuilt: bool,
    /// Documents written.
    pub indexed: usize,
    /// Documents deleted without replacement.
    pub removed: usize,
    /// Tasks with nothing to index.
    pub skipped: usize,
    /// Tasks whose data could not be fetched.
    pub failed_fetches: usize,
    /// Whether the run stopped early because it was cancelled.
    pub cancelled: bool,
}

/// Performs maintenance runs against the store.
pub struct Maintainer {
    /// Source of tasks and task data.
    repository: Arc<dyn TaskRepository>,
    /// The index store.
    store: Arc<IndexStore>,
    /// Snapshot cache to invalidate after each commit.
    cache: Arc<SnapshotCache>,
    /// Pending changes keyed by task handle; later changes replace earlier ones.
    queue: Mutex<HashMap<String, PendingChange>>,
    /// Rebuild requests so far. A rebuild is due while this is ahead of
    /// `rebuilt_through`.
    rebuild_requests: AtomicU64,
    /// Request count observed at the start of the last committed rebuild.
    rebuilt_through: AtomicU64,
    /// Set to stop the current run at its next check.
    cancel: AtomicBool,
}

impl Maintainer {
    /// Creates a maintainer. The store is rebuilt on the first run when it
    /// was created empty.
    pub fn new(
        repository: Arc<dyn TaskRepository>,
        store: Arc<IndexStore>,
        cache: Arc<SnapshotCache>,
    ) -> Self {
        let requests = u64::from(store.was_created());
        Self {
            repository,
            store,
            cache,
            queue: Mutex::new(HashMap::new()),
            rebuild_requests: AtomicU64::new(requests),
            rebuilt_through: AtomicU64::new(0),
            cancel: AtomicBool::new(false),
        }
    }

    /// Queues a change, replacing any queued change for the same task.
    pub fn enqueue(&self, handle: impl Into<String>, change: PendingChange) {
        self.queue.lock().insert(handle.into(), change);
    }

    /// Number of queued changes.
    pub fn pending(&self) -> usize {
        self.queue.lock().len()
    }

    /// Makes the next run a full rebuild. A request made while a rebuild is
    /// in progress is not satisfied by that rebuild.
    pub fn request_rebuild(&self) {
        self.rebuild_requests.fetch_add(1, Ordering::SeqCst);
    }

    /// Whether the next run will rebuild.
    pub fn needs_rebuild(&self) -> bool {
        self.rebuild_requests.load(Ordering::SeqCst) > self.rebuilt_through.load(Ordering::SeqCst)
    }

    /// Asks the current run to stop.
    fn cancel(&self) {
        self.cancel.store(true, Ordering::SeqCst);
    }

    /// Clears a previous cancellation before a run starts.
    fn reset_cancel(&self) {
        self.cancel.store(false, Ordering::SeqCst);
    }

    /// Whether the current run should stop.
    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::SeqCst)
    }

    /// Performs one run. `report` is told which phase the run is in.
    pub fn run(&self, report: &dyn Fn(MaintenanceState)) -> Result<MaintenanceStats, IndexError> {
        let mut stats = MaintenanceStats::default();
        if self.is_cancelled() {
            stats.cancelled = true;
            return Ok(stats);
        }

        if !self.needs_rebuild()
            && let Err(e) = self.cache.snapshot(&self.store)
        {
            warn!(error = %e, "index store cannot be read, rebuilding");
            self.request_rebuild();
        }

        if self.needs_rebuild() {
            report(MaintenanceState::RunningFullRebuild);
            self.rebuild_all(&mut stats)?;
            if stats.cancelled {
                return Ok(stats);
            }
        }

        report(MaintenanceState::RunningIncrementalUpdate);
        self.drain(&mut stats)?;
        Ok(stats)
    }

    /// Truncates the store and indexes every task in the repository.
    ///
    /// Only requests made before the rebuild started are cleared, and only
    /// once it commits.
    fn rebuild_all(&self, stats: &mut MaintenanceStats) -> Result<(), IndexError> {
        stats.rebuilt = true;
        let requests = self.rebuild_requests.load(Ordering::SeqCst);
        self.queue.lock().clear();

        let mut writer = self.rebuild_writer()?;
        let tasks = self.repository.all_tasks();

        for (i, task) in tasks.iter().enumerate() {
            if i % CANCEL_CHECK_INTERVAL == 0 && self.is_cancelled() {
                debug!(done = i, total = tasks.len(), "rebuild cancelled");
                stats.cancelled = true;
                return Ok(());
            }

            let data = match self.repository.task_data(task) {
                Ok(data) => data,
                Err(e) => {
                    if stats.failed_fetches == 0 {
                        warn!(handle = %task.handle, error = %e, "skipping task whose data cannot be read");
                    }
                    stats.failed_fetches += 1;
                    continue;
                }
            };

            match TaskDocument::build(task, data.as_ref()) {
                Some(doc) => {
                    writer.add(&doc)?;
                    stats.indexed += 1;
                }
                None => stats.skipped += 1,
            }
        }

        if self.is_cancelled() {
            debug!(total = tasks.len(), "rebuild cancelled before commit");
            stats.cancelled = true;
            return Ok(());
        }

        writer.commit()?;
        writer.close()?;
        self.rebuilt_through.fetch_max(requests, Ordering::SeqCst);
        self.cache.invalidate();

        if stats.failed_fetches > 1 {
            warn!(count = stats.failed_fetches, "task data could not be read for several tasks");
        }
        info!(
            indexed = stats.indexed,
            skipped = stats.skipped,
            failed = stats.failed_fetches,
            "rebuilt task index"
        );
        Ok(())
    }

    /// Opens a truncating writer. A directory store that refuses is reset
    /// and tried once more.
    fn rebuild_writer(&self) -> Result<StoreWriter, IndexError> {
        match self.store.writer(true) {
            Ok(writer) => Ok(writer),
            Err(e) if matches!(self.store.location(), StoreLocation::Directory(_)) => {
                warn!(error = %e, "cannot open index writer, resetting store");
                self.store.reset()?;
                self.store.writer(true)
            }
            Err(e) => Err(e),
        }
    }

    /// Applies queued changes until the queue is empty.
    fn drain(&self, stats: &mut MaintenanceStats) -> Result<(), IndexError> {
        loop {
            if self.is_cancelled() {
                stats.cancelled = true;
                return Ok(());
            }

            let batch = mem::take(&mut *self.queue.lock());
            if batch.is_empty() {
                return Ok(());
            }

            if let Err(e) = self.apply(&batch, stats) {
                if e.is_corruption() {
                    self.request_rebuild();
                }
                self.requeue(batch);
                return Err(e);
            }
            self.cache.invalidate();
            debug!(changes = batch.len(), "applied queued changes");
        }
    }

    /// Replaces the documents of every task in the batch and commits.
    fn apply(
        &self,
        batch: &HashMap<String, PendingChange>,
        stats: &mut MaintenanceStats,
    ) -> Result<(), IndexError> {
        let mut writer = self.store.writer(false)?;
        for (handle, change) in batch {
            writer.delete_identifier(handle);
            let doc = match change {
                PendingChange::Update { task, data } => TaskDocument::build(task, data.as_ref()),
                PendingChange::Remove => None,
            };
            match doc {
                Some(doc) => {
                    writer.add(&doc)?;
                    stats.indexed += 1;
                }
                None => stats.removed += 1,
            }
        }
        writer.commit()?;
        writer.close()
    }

    /// Puts a failed batch back. Changes queued since it was taken win.
    fn requeue(&self, batch: HashMap<String, PendingChange>) {
        let mut queue = self.queue.lock();
        for (handle, change) in batch {
            queue.entry(handle).or_insert(change);
        }
    }
}

#[cfg(test)]
mod test {
    use std::{cell::RefCell, thread};

    use super::{test_support::GatedTasks, *};
    use crate::{
        memory::InMemoryTaskList,
        store::StoreLocation,
        task::{TaskAttribute, attribute},
    };

    struct Fixture {
        list: Arc<InMemoryTaskList>,
        store: Arc<IndexStore>,
        maintainer: Maintainer,
    }

    impl Fixture {
        fn new(tasks: &[Task]) -> Self {
            let list = Arc::new(InMemoryTaskList::new());
            for task in tasks {
                list.add_task(task.clone());
            }
            let store = Arc::new(IndexStore::open(StoreLocation::InMemory).unwrap());
            let maintainer = Maintainer::new(
                list.clone(),
                store.clone(),
                Arc::new(SnapshotCache::new()),
            );
            Self {
                list,
                store,
                maintainer,
            }
        }

        fn run(&self) -> MaintenanceStats {
            self.maintainer.run(&|_| {}).unwrap()
        }

        fn documents(&self) -> u64 {
            self.store.snapshot().unwrap().num_docs()
        }
    }

    #[test]
    fn first_run_rebuilds_new_store() {
        let f = Fixture::new(&[Task::local("local-1", "one"), Task::local("local-2", "two")]);
        assert!(f.maintainer.needs_rebuild());

        let phases = RefCell::new(Vec::new());
        let stats = f.maintainer.run(&|p| phases.borrow_mut().push(p)).unwrap();

        assert!(stats.rebuilt);
        assert_eq!(stats.indexed, 2);
        assert!(!f.maintainer.needs_rebuild());
        assert_eq!(f.documents(), 2);
        assert_eq!(
            *phases.borrow(),
            vec![
                MaintenanceState::RunningFullRebuild,
                MaintenanceState::RunningIncrementalUpdate
            ]
        );
    }

    #[test]
    fn rebuild_skips_failing_and_dataless_tasks() {
        let bug = Task::repository("http://bugs/1", "bugzilla", "Crash");
        let orphan = Task::repository("http://bugs/2", "bugzilla", "No data");
        let f = Fixture::new(&[Task::local("local-1", "one"), bug.clone(), orphan]);
        f.list.set_task_data(
            &bug.handle,
            TaskData::new(vec![TaskAttribute::new(attribute::SUMMARY, "Crash")]),
        );
        f.list.set_data_failure("local-1", true);

        let stats = f.run();
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed_fetches, 1);
        assert_eq!(f.documents(), 1);
    }

    #[test]
    fn rebuild_supersedes_queue() {
        let f = Fixture::new(&[Task::local("local-1", "one")]);
        f.maintainer
            .enqueue("local-9", PendingChange::Update {
                task: Task::local("local-9", "stale"),
                data: None,
            });
        f.run();
        assert_eq!(f.maintainer.pending(), 0);
        assert_eq!(f.documents(), 1);
    }

    #[test]
    fn incremental_update_replaces_and_removes() {
        let f = Fixture::new(&[Task::local("local-1", "one"), Task::local("local-2", "two")]);
        f.run();

        f.maintainer.enqueue("local-1", PendingChange::Update {
            task: Task::local("local-1", "uno"),
            data: None,
        });
        f.maintainer.enqueue("local-2", PendingChange::Remove);
        let stats = f.run();

        assert!(!stats.rebuilt);
        assert_eq!(stats.indexed, 1);
        assert_eq!(stats.removed, 1);
        assert_eq!(f.documents(), 1);
        assert_eq!(f.maintainer.pending(), 0);
    }

    #[test]
    fn queued_changes_coalesce() {
        let f = Fixture::new(&[]);
        f.run();
        for summary in ["a", "b", "c"] {
            f.maintainer.enqueue("local-1", PendingChange::Update {
                task: Task::local("local-1", summary),
                data: None,
            });
        }
        assert_eq!(f.maintainer.pending(), 1);
        assert_eq!(f.run().indexed, 1);
        assert_eq!(f.documents(), 1);
    }

    #[test]
    fn cancelled_rebuild_keeps_flag() {
        let f = Fixture::new(&[Task::local("local-1", "one")]);
        f.maintainer.cancel();
        let stats = f.run();
        assert!(stats.cancelled);
        assert!(f.maintainer.needs_rebuild());
        assert_eq!(f.documents(), 0);

        f.maintainer.reset_cancel();
        assert!(f.run().rebuilt);
        assert_eq!(f.documents(), 1);
    }

    fn gated(tasks: usize) -> (Arc<GatedTasks>, Arc<IndexStore>, Arc<Maintainer>) {
        let tasks = GatedTasks::with_tasks(tasks);
        let store = Arc::new(IndexStore::open(StoreLocation::InMemory).unwrap());
        let maintainer = Arc::new(Maintainer::new(
            tasks.clone(),
            store.clone(),
            Arc::new(SnapshotCache::new()),
        ));
        (tasks, store, maintainer)
    }

    #[test]
    fn cancel_after_enumeration_skips_commit() {
        let (tasks, store, maintainer) = gated(1);
        let run = {
            let maintainer = Arc::clone(&maintainer);
            thread::spawn(move || maintainer.run(&|_| {}).unwrap())
        };

        tasks.wait_entered();
        maintainer.cancel();
        tasks.release();
        let stats = run.join().unwrap();

        assert!(stats.cancelled);
        assert!(maintainer.needs_rebuild());
        assert_eq!(store.snapshot().unwrap().num_docs(), 0);
    }

    #[test]
    fn rebuild_request_during_rebuild_survives_it() {
        let (tasks, store, maintainer) = gated(2);
        let run = {
            let maintainer = Arc::clone(&maintainer);
            thread::spawn(move || maintainer.run(&|_| {}).unwrap())
        };

        tasks.wait_entered();
        maintainer.request_rebuild();
        tasks.release();
        let stats = run.join().unwrap();

        assert!(stats.rebuilt);
        assert_eq!(store.snapshot().unwrap().num_docs(), 2);
        assert!(maintainer.needs_rebuild());

        assert!(maintainer.run(&|_| {}).unwrap().rebuilt);
        assert!(!maintainer.needs_rebuild());
    }

    #[test]
    fn failed_batch_is_requeued_without_overwriting_newer_changes() {
        let f = Fixture::new(&[]);
        f.maintainer.enqueue("local-1", PendingChange::Remove);
        let mut batch = HashMap::new();
        batch.insert("local-1".to_string(), PendingChange::Update {
            task: Task::local("local-1", "old"),
            data: None,
        });
        batch.insert("local-2".to_string(), PendingChange::Remove);

        f.maintainer.requeue(batch);

        let queue = f.maintainer.queue.lock();
        assert_eq!(queue.get("local-1"), Some(&PendingChange::Remove));
        assert_eq!(queue.get("local-2"), Some(&PendingChange::Remove));
    }
}
