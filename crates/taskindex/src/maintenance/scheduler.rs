//! Delayed, debounced scheduling of maintenance runs on one worker thread.
//!
//! A trigger sets a deadline; triggers that arrive before it fires move the
//! deadline out to the latest one requested instead of queueing more runs.
//! A zero delay runs on the caller's thread and returns when the run is done.
//! At most one run is active at a time on either path.

use std::{
    sync::Arc,
    thread::{self, JoinHandle},
    time::{Duration, Instant},
};

use parking_lot::{Condvar, Mutex, MutexGuard};
use tracing::{debug, error, warn};

use super::{MaintenanceState, MaintenanceStats, Maintainer};
use crate::error::IndexError;

/// Name of the maintenance worker thread.
const WORKER_NAME: &str = "task-index-maintenance";

/// Why a run was scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    /// The first run after the index was opened.
    Startup,
    /// An explicit reindex or a task change.
    Reindex,
}

impl Trigger {
    /// State reported while a run for this trigger waits.
    fn scheduled_state(self) -> MaintenanceState {
        match self {
            Self::Startup => MaintenanceState::ScheduledStartup,
            Self::Reindex => MaintenanceState::ScheduledReindex,
        }
    }
}

/// State guarded by the scheduler lock.
struct SchedulerState {
    /// Reported phase.
    phase: MaintenanceState,
    /// When the next run fires, if one is scheduled.
    due: Option<Instant>,
    /// Whether a run is active.
    running: bool,
    /// Set once by shutdown; no run starts afterwards.
    shutdown: bool,
    /// Completed runs.
    runs: u64,
    /// Counters from the last run that did not fail.
    last_run: Option<MaintenanceStats>,
}

/// Shared between the handle and the worker.
struct Shared {
    /// Guarded state.
    state: Mutex<SchedulerState>,
    /// Signalled on every state change.
    changed: Condvar,
    /// Does the work.
    maintainer: Arc<Maintainer>,
}

impl Shared {
    /// Marks a run as started. Must be called with `running` clear.
    fn begin(&self, state: &mut SchedulerState) {
        state.running = true;
        state.due = None;
        state.phase = if self.maintainer.needs_rebuild() {
            MaintenanceState::RunningFullRebuild
        } else {
            MaintenanceState::RunningIncrementalUpdate
        };
        self.maintainer.reset_cancel();
    }

    /// Performs one run without holding the lock and records the outcome.
    fn execute(&self, mut state: MutexGuard<'_, SchedulerState>) {
        self.begin(&mut state);
        drop(state);

        let started = Instant::now();
        let result = self.maintainer.run(&|phase| self.state.lock().phase = phase);
        log_outcome(&result, started);

        let mut state = self.state.lock();
        state.running = false;
        state.runs += 1;
        if let Ok(stats) = result {
            state.last_run = Some(stats);
        }
        state.phase = if state.due.is_some() {
            MaintenanceState::ScheduledReindex
        } else {
            MaintenanceState::Idle
        };
        self.changed.notify_all();
    }

    /// Worker loop: waits for a due run, performs it, repeats until shutdown.
    fn work(&self) {
        loop {
            let mut state = self.state.lock();
            loop {
                if state.shutdown {
                    return;
                }
                match state.due {
                    Some(due) if !state.running => {
                        if Instant::now() >= due {
                            break;
                        }
                        self.changed.wait_until(&mut state, due);
                    }
                    _ => self.changed.wait(&mut state),
                }
            }
            self.execute(state);
        }
    }
}

/// Logs how a run ended.
fn log_outcome(result: &Result<MaintenanceStats, IndexError>, started: Instant) {
    match result {
        Ok(stats) if stats.cancelled => debug!("maintenance run cancelled"),
        Ok(stats) => debug!(
            elapsed_ms = started.elapsed().as_millis() as u64,
            rebuilt = stats.rebuilt,
            indexed = stats.indexed,
            removed = stats.removed,
            "maintenance run finished"
        ),
        Err(e) => error!(error = %e, "Failed to update task list index"),
    }
}

/// Handle to the maintenance worker.
pub struct Scheduler {
    /// State shared with the worker.
    shared: Arc<Shared>,
    /// Worker thread, taken by shutdown.
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler {
    /// Starts the worker thread. Nothing runs until [`Scheduler::schedule`].
    pub fn start(maintainer: Arc<Maintainer>) -> Result<Self, IndexError> {
        let shared = Arc::new(Shared {
            state: Mutex::new(SchedulerState {
                phase: MaintenanceState::Idle,
                due: None,
                running: false,
                shutdown: false,
                runs: 0,
                last_run: None,
            }),
            changed: Condvar::new(),
            maintainer,
        });

        let worker_shared = Arc::clone(&shared);
        let worker = thread::Builder::new()
            .name(WORKER_NAME.to_string())
            .spawn(move || worker_shared.work())?;

        Ok(Self {
            shared,
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Schedules a run after `delay`, or performs one now when `delay` is zero.
    pub fn schedule(&self, trigger: Trigger, delay: Duration) {
        let mut state = self.shared.state.lock();
        if state.shutdown {
            return;
        }

        if delay.is_zero() {
            while state.running && !state.shutdown {
                self.shared.changed.wait(&mut state);
            }
            if !state.shutdown {
                self.shared.execute(state);
            }
            return;
        }

        let due = Instant::now() + delay;
        state.due = Some(state.due.map_or(due, |existing| existing.max(due)));
        if !state.running && state.phase == MaintenanceState::Idle {
            state.phase = trigger.scheduled_state();
        }
        debug!(?trigger, delay_ms = delay.as_millis() as u64, "scheduled maintenance");
        self.shared.changed.notify_all();
    }

    /// Blocks until no run is active or scheduled.
    pub fn wait_until_idle(&self) {
        let mut state = self.shared.state.lock();
        while (state.running || state.due.is_some()) && !state.shutdown {
            self.shared.changed.wait(&mut state);
        }
    }

    /// Current phase.
    pub fn state(&self) -> MaintenanceState {
        self.shared.state.lock().phase
    }

    /// Number of completed runs.
    pub fn runs(&self) -> u64 {
        self.shared.state.lock().runs
    }

    /// Counters from the last run that did not fail.
    pub fn last_run(&self) -> Option<MaintenanceStats> {
        self.shared.state.lock().last_run.clone()
    }

    /// Cancels any active run, drops any scheduled one and stops the worker.
    ///
    /// Waits at most `timeout` for an active run to stop. Returns false if it
    /// did not; the worker is then left to finish on its own.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let deadline = Instant::now() + timeout;
        let mut state = self.shared.state.lock();
        state.shutdown = true;
        state.due = None;
        self.shared.maintainer.cancel();
        self.shared.changed.notify_all();

        while state.running {
            if self
                .shared
                .changed
                .wait_until(&mut state, deadline)
                .timed_out()
            {
                break;
            }
        }
        let stopped = !state.running;
        state.phase = MaintenanceState::Idle;
        drop(state);

        let worker = self.worker.lock().take();
        if stopped {
            if let Some(worker) = worker
                && worker.join().is_err()
            {
                warn!("maintenance worker panicked");
            }
        } else {
            warn!(
                timeout_ms = timeout.as_millis() as u64,
                "maintenance run did not stop in time, detaching worker"
            );
        }
        stopped
    }
}
