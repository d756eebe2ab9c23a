//! The task list index facade.
//!
//! [`TaskListIndex`] answers "does this task match this pattern" and "which
//! tasks match this pattern" against an index that a background worker keeps
//! in step with the task repository.

mod listener;
mod options;
#[cfg(test)]
mod tests;

use std::{
    collections::HashSet,
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use parking_lot::RwLock;
use tracing::{debug, warn};

use self::listener::IndexListener;
pub use self::options::{
    DEFAULT_CLOSE_TIMEOUT, DEFAULT_MAX_MATCH_HITS, DEFAULT_REINDEX_DELAY, DEFAULT_STARTUP_DELAY,
    IndexOptions, MAX_STARTUP_DELAY,
};
use crate::{
    error::IndexError,
    field::TaskField,
    maintenance::{MaintenanceState, MaintenanceStats, Maintainer, Scheduler, Trigger},
    query::QueryTranslator,
    snapshot::SnapshotCache,
    store::{IndexStore, StoreLocation},
    task::{ListenerId, Task, TaskRepository},
};

/// Pattern that asks for a full rebuild as a side effect of matching.
pub const RESET_COMMAND: &str = "index:reset";

/// Settings that can change while the index is open.
struct Settings {
    /// Field searched by unqualified pattern words.
    default_field: TaskField,
    /// Cap on hits gathered for one `matches` pattern.
    max_match_hits: usize,
    /// Delay for change and reindex runs.
    reindex_delay: Duration,
    /// Delay before the first run.
    startup_delay: Duration,
    /// Bound on how long closing waits.
    close_timeout: Duration,
}

/// Index state shared with the repository listener.
struct Inner {
    /// Source of tasks.
    repository: Arc<dyn TaskRepository>,
    /// The index store.
    store: Arc<IndexStore>,
    /// Shared snapshot and result cache.
    cache: Arc<SnapshotCache>,
    /// Pattern translator.
    translator: QueryTranslator,
    /// Mutable settings.
    settings: RwLock<Settings>,
    /// Performs maintenance runs.
    maintainer: Arc<Maintainer>,
    /// Schedules maintenance runs.
    scheduler: Scheduler,
    /// Set by close.
    closed: AtomicBool,
}

impl Inner {
    /// Whether the index has been closed.
    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Schedules a run after the reindex delay.
    fn schedule_reindex(&self) {
        let delay = self.settings.read().reindex_delay;
        self.scheduler.schedule(Trigger::Reindex, delay);
    }

    /// Flags the store for rebuild after a failed read.
    fn recover(&self, error: &IndexError) {
        if error.is_corruption() {
            warn!(error = %error, "index cannot be read, scheduling rebuild");
            self.maintainer.request_rebuild();
            self.schedule_reindex();
        } else {
            warn!(error = %error, "task index search failed");
        }
    }
}

/// Full-text index over a task repository.
///
/// Opening the index subscribes it to the repository's change notifications
/// and schedules the first maintenance run. Queries never fail: when the
/// index cannot be read they report no match and a rebuild is scheduled.
///
/// Dropping the index closes it.
pub struct TaskListIndex {
    /// State shared with the listener.
    inner: Arc<Inner>,
    /// Registration with the repository.
    listener: ListenerId,
}

impl TaskListIndex {
    /// Opens the index at `location` over `repository`.
    pub fn open(
        repository: Arc<dyn TaskRepository>,
        location: StoreLocation,
        options: IndexOptions,
    ) -> Result<Self, IndexError> {
        options.validate()?;

        let store = Arc::new(IndexStore::open(location)?);
        let cache = Arc::new(SnapshotCache::new());
        let maintainer = Arc::new(Maintainer::new(
            Arc::clone(&repository),
            Arc::clone(&store),
            Arc::clone(&cache),
        ));
        let scheduler = Scheduler::start(Arc::clone(&maintainer))?;
        let translator = QueryTranslator::new(store.schema().clone());

        let inner = Arc::new(Inner {
            repository: Arc::clone(&repository),
            store,
            cache,
            translator,
            settings: RwLock::new(Settings {
                default_field: options.default_field,
                max_match_hits: options.max_match_hits,
                reindex_delay: options.reindex_delay,
                startup_delay: options.startup_delay,
                close_timeout: options.close_timeout,
            }),
            maintainer,
            scheduler,
            closed: AtomicBool::new(false),
        });

        let listener = repository.add_listener(Arc::new(IndexListener::new(Arc::downgrade(&inner))));
        inner
            .scheduler
            .schedule(Trigger::Startup, options.startup_delay);

        Ok(Self { inner, listener })
    }

    /// Opens an index held in memory.
    pub fn in_memory(
        repository: Arc<dyn TaskRepository>,
        options: IndexOptions,
    ) -> Result<Self, IndexError> {
        Self::open(repository, StoreLocation::InMemory, options)
    }

    /// Whether `task` matches `pattern` under the default field.
    ///
    /// Hits for the most recent pattern are cached, so testing many tasks
    /// against one pattern searches once. [`RESET_COMMAND`] also requests a
    /// rebuild.
    pub fn matches(&self, task: &Task, pattern: &str) -> bool {
        let inner = &self.inner;
        if inner.is_closed() {
            return false;
        }
        if pattern == RESET_COMMAND {
            self.reindex();
        }

        let (field, limit) = {
            let settings = inner.settings.read();
            (settings.default_field, settings.max_match_hits)
        };
        let hits = inner.cache.hits(&inner.store, pattern, field, |snapshot| {
            let started = Instant::now();
            let query = inner.translator.translate(pattern, field);
            let hits: HashSet<String> = snapshot
                .search(query.as_ref(), limit)?
                .into_iter()
                .map(|hit| hit.identifier)
                .collect();
            debug!(
                pattern,
                %field,
                hits = hits.len(),
                elapsed_us = started.elapsed().as_micros() as u64,
                "computed match set"
            );
            Ok(hits)
        });

        match hits {
            Ok(hits) => hits.contains(&task.handle),
            Err(e) => {
                inner.recover(&e);
                false
            }
        }
    }

    /// Passes up to `limit` tasks matching `pattern` to `collector`, best
    /// match first, and returns how many were passed.
    ///
    /// Hits whose task no longer exists in the repository are skipped.
    pub fn find<F>(&self, pattern: &str, mut collector: F, limit: usize) -> usize
    where
        F: FnMut(Task),
    {
        let inner = &self.inner;
        if inner.is_closed() {
            return 0;
        }
        let field = inner.settings.read().default_field;

        let hits = inner.cache.snapshot(&inner.store).and_then(|snapshot| {
            let query = inner.translator.translate(pattern, field);
            snapshot.search(query.as_ref(), limit)
        });
        let hits = match hits {
            Ok(hits) => hits,
            Err(e) => {
                inner.recover(&e);
                return 0;
            }
        };

        let mut found = 0;
        for hit in hits {
            if let Some(task) = inner.repository.task_by_handle(&hit.identifier) {
                collector(task);
                found += 1;
            }
        }
        found
    }

    /// Requests a full rebuild after the reindex delay.
    pub fn reindex(&self) {
        if self.inner.is_closed() {
            return;
        }
        self.inner.maintainer.request_rebuild();
        self.inner.schedule_reindex();
    }

    /// Blocks until no maintenance run is active or scheduled.
    pub fn wait_until_idle(&self) {
        self.inner.scheduler.wait_until_idle();
    }

    /// Unsubscribes from the repository, stops maintenance and releases the
    /// cached snapshot. Later calls do nothing.
    pub fn close(&self) {
        let inner = &self.inner;
        if inner.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        inner.repository.remove_listener(self.listener);
        let timeout = inner.settings.read().close_timeout;
        inner.scheduler.shutdown(timeout);
        inner.cache.invalidate();
        debug!(location = %inner.store.location(), "closed task index");
    }

    /// Whether [`TaskListIndex::close`] has been called.
    pub fn is_closed(&self) -> bool {
        self.inner.is_closed()
    }

    /// Field searched by unqualified pattern words.
    pub fn default_field(&self) -> TaskField {
        self.inner.settings.read().default_field
    }

    /// Changes the default field.
    pub fn set_default_field(&self, field: TaskField) {
        self.inner.settings.write().default_field = field;
        self.inner.cache.clear_results();
    }

    /// Cap on hits gathered for one `matches` pattern.
    pub fn max_match_hits(&self) -> usize {
        self.inner.settings.read().max_match_hits
    }

    /// Changes the hit cap for `matches`.
    pub fn set_max_match_hits(&self, hits: usize) {
        self.inner.settings.write().max_match_hits = hits;
        self.inner.cache.clear_results();
    }

    /// Delay between a change and the run that indexes it.
    pub fn reindex_delay(&self) -> Duration {
        self.inner.settings.read().reindex_delay
    }

    /// Changes the reindex delay for runs scheduled from now on.
    pub fn set_reindex_delay(&self, delay: Duration) {
        self.inner.settings.write().reindex_delay = delay;
    }

    /// Delay the index was opened with before its first run.
    pub fn startup_delay(&self) -> Duration {
        self.inner.settings.read().startup_delay
    }

    /// Where the maintenance task is in its cycle.
    pub fn maintenance_state(&self) -> MaintenanceState {
        self.inner.scheduler.state()
    }

    /// Counters from the last maintenance run that did not fail.
    pub fn last_maintenance_run(&self) -> Option<MaintenanceStats> {
        self.inner.scheduler.last_run()
    }

    /// Number of documents visible to readers.
    pub fn indexed_document_count(&self) -> Result<u64, IndexError> {
        if self.inner.is_closed() {
            return Err(IndexError::Closed);
        }
        Ok(self.inner.cache.snapshot(&self.inner.store)?.num_docs())
    }
}

impl Drop for TaskListIndex {
    fn drop(&mut self) {
        self.close();
    }
}
