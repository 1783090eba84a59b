//! Thread Manager

use crate::error::*;
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

/// A unit of parallel work addressed by an index in `[0, num_indices)`.
pub trait Task: Sync {
    /// Perform the work for one index. Called exactly once per index per run
    /// unless the run is cancelled or fails first.
    ///
    /// * `index`  - The index.
    /// * `worker` - The worker executing the index.
    fn execute(&self, index: usize, worker: &Worker<'_>) -> Result<(), TaskError>;

    /// Called once on every worker after it stops claiming indices, including
    /// after cancellation or failure.
    ///
    /// * `worker` - The worker that is finishing.
    fn cleanup(&self, _worker: &Worker<'_>) {}
}

impl<F> Task for F
where
    F: Fn(usize, &Worker<'_>) -> Result<(), TaskError> + Sync,
{
    fn execute(&self, index: usize, worker: &Worker<'_>) -> Result<(), TaskError> {
        self(index, worker)
    }
}

/// Atomic reference counted `Task`.
pub type ArcTask = Arc<dyn Task + Send + Sync>;

/// No run in progress.
const IDLE: u8 = 0;

/// A run is in progress.
const RUNNING: u8 = 1;

/// A run is in progress and cancellation was requested.
const CANCELLED: u8 = 2;

/// Handle given to a task identifying the worker thread running it.
pub struct Worker<'a> {
    /// Worker number in `[0, num_workers)`.
    id: usize,

    /// Run state of the owning manager.
    state: &'a AtomicU8,
}

impl Worker<'_> {
    /// Returns the worker number in `[0, num_workers)`.
    pub fn id(&self) -> usize {
        self.id
    }

    /// Stop dispatching new indices. Indices already executing finish normally.
    pub fn cancel(&self) {
        self.state.store(CANCELLED, Ordering::Release);
    }

    /// Returns true if cancellation has been requested for the current run.
    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }
}

/// Outcome of a run that did not fail.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum RunStatus {
    /// Every index was executed.
    Completed,

    /// Cancellation stopped dispatch before every index was executed.
    Cancelled,
}

/// Fork-join executor that runs a `Task` for every index in a range across a
/// fixed number of worker threads.
///
/// Workers claim indices from a shared counter, so each index is executed at
/// most once and, absent cancellation or failure, exactly once. `run()` blocks
/// until every worker has called `Task::cleanup()` and exited. A manager can be
/// run any number of times in sequence.
///
/// Failure policy: the first index whose `execute` returns an error or panics
/// stops dispatch and is reported; later failures are only logged.
pub struct ThreadManager {
    /// Number of worker threads.
    num_threads: usize,

    /// Number of indices `run()` dispatches.
    num_indices: usize,

    /// Task `run()` dispatches.
    task: Option<ArcTask>,

    /// `IDLE`, `RUNNING` or `CANCELLED`. Cancellation is only recorded while
    /// a run is in progress and is cleared together with the run.
    state: AtomicU8,
}

impl Default for ThreadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl ThreadManager {
    /// Returns a new `ThreadManager` with one worker per logical CPU and no task.
    pub fn new() -> Self {
        Self::with_threads(num_cpus::get())
    }

    /// Returns a new `ThreadManager` with a fixed number of workers.
    ///
    /// * `num_threads` - Number of worker threads; 0 is treated as 1.
    pub fn with_threads(num_threads: usize) -> Self {
        Self {
            num_threads: num_threads.max(1),
            num_indices: 0,
            task: None,
            state: AtomicU8::new(IDLE),
        }
    }

    /// Returns the number of worker threads.
    pub fn num_threads(&self) -> usize {
        self.num_threads
    }

    /// Set the number of worker threads.
    ///
    /// * `num_threads` - Number of worker threads; 0 is treated as 1.
    pub fn set_num_threads(&mut self, num_threads: usize) {
        self.num_threads = num_threads.max(1);
    }

    /// Returns the number of indices `run()` dispatches.
    pub fn num_indices(&self) -> usize {
        self.num_indices
    }

    /// Set the number of indices `run()` dispatches. Needs exclusive access, so
    /// it cannot be called while a run is in progress.
    ///
    /// * `num_indices` - Number of indices.
    pub fn set_num_indices(&mut self, num_indices: usize) {
        self.num_indices = num_indices;
    }

    /// Set the task `run()` dispatches. Needs exclusive access, so it cannot be
    /// called while a run is in progress.
    ///
    /// * `task` - The task.
    pub fn set_task(&mut self, task: ArcTask) {
        self.task = Some(task);
    }

    /// Request cancellation of the current run. Workers stop claiming new
    /// indices; indices already executing finish normally. Has no effect when
    /// no run is in progress.
    pub fn cancel(&self) {
        let _ = self
            .state
            .compare_exchange(RUNNING, CANCELLED, Ordering::AcqRel, Ordering::Acquire);
    }

    /// Returns true if cancellation has been requested for the current run.
    pub fn is_cancelled(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED
    }

    /// Returns true while a run is in progress.
    pub fn is_running(&self) -> bool {
        self.state.load(Ordering::Acquire) != IDLE
    }

    /// Execute the configured task for every configured index and wait for
    /// completion.
    pub fn run(&self) -> Result<RunStatus, ThreadError> {
        let task = self.task.as_ref().ok_or(ThreadError::NoTask)?;
        self.run_with(self.num_indices, task.as_ref())
    }

    /// Execute a borrowed task for `num_indices` indices using this manager's
    /// workers, without changing the configured task. A cancellation request
    /// made while no run is in progress is discarded.
    ///
    /// * `num_indices` - Number of indices.
    /// * `task`        - The task.
    pub fn run_with(&self, num_indices: usize, task: &dyn Task) -> Result<RunStatus, ThreadError> {
        if self
            .state
            .compare_exchange(IDLE, RUNNING, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(ThreadError::AlreadyRunning);
        }
        let _running = RunningGuard(&self.state);

        if num_indices == 0 {
            return Ok(RunStatus::Completed);
        }

        let n_workers = self.num_threads.min(num_indices);
        debug!("Dispatching {} indices on {} workers", num_indices, n_workers);

        let next_index = AtomicUsize::new(0);
        let executed = AtomicUsize::new(0);
        let failed = AtomicBool::new(false);
        let (tx_error, rx_error) = crossbeam_channel::unbounded::<ThreadError>();

        thread::scope(|scope| {
            for id in 0..n_workers {
                let dispatch = Dispatch {
                    num_indices,
                    next_index: &next_index,
                    executed: &executed,
                    failed: &failed,
                    state: &self.state,
                    tx_error: tx_error.clone(),
                };
                let spawned = thread::Builder::new()
                    .name(format!("worker-{id}"))
                    .spawn_scoped(scope, move || dispatch.work(id, task));
                if let Err(err) = spawned {
                    failed.store(true, Ordering::Release);
                    let _ = tx_error.send(ThreadError::Spawn(err.to_string()));
                    break;
                }
            }
        });
        drop(tx_error);

        let mut errors = rx_error.try_iter();
        if let Some(first) = errors.next() {
            warn!("{first}");
            for other in errors {
                warn!("Additional failure ignored: {other}");
            }
            return Err(first);
        }

        let executed = executed.load(Ordering::Acquire);
        if executed == num_indices {
            debug!("Completed {} indices", num_indices);
            Ok(RunStatus::Completed)
        } else {
            debug!("Cancelled after {} of {} indices", executed, num_indices);
            Ok(RunStatus::Cancelled)
        }
    }
}

/// Returns the manager to `IDLE` when a run ends, including by panic.
struct RunningGuard<'a>(&'a AtomicU8);

impl Drop for RunningGuard<'_> {
    fn drop(&mut self) {
        self.0.store(IDLE, Ordering::Release);
    }
}

/// Shared dispatch state handed to one worker.
struct Dispatch<'a> {
    num_indices: usize,
    next_index: &'a AtomicUsize,
    executed: &'a AtomicUsize,
    failed: &'a AtomicBool,
    state: &'a AtomicU8,
    tx_error: crossbeam_channel::Sender<ThreadError>,
}

impl Dispatch<'_> {
    /// Returns true if no further index may be started.
    fn stopped(&self) -> bool {
        self.state.load(Ordering::Acquire) == CANCELLED || self.failed.load(Ordering::Acquire)
    }

    /// Worker loop: claim indices until the range is exhausted or dispatch is
    /// stopped, then run the task's cleanup.
    ///
    /// * `id`   - Worker number.
    /// * `task` - The task.
    fn work(self, id: usize, task: &dyn Task) {
        let worker = Worker {
            id,
            state: self.state,
        };

        while !self.stopped() {
            let index = self.next_index.fetch_add(1, Ordering::AcqRel);
            if index >= self.num_indices || self.stopped() {
                break;
            }

            let error = match panic::catch_unwind(AssertUnwindSafe(|| task.execute(index, &worker))) {
                Ok(Ok(())) => {
                    self.executed.fetch_add(1, Ordering::AcqRel);
                    continue;
                }
                Ok(Err(err)) => ThreadError::TaskFailed {
                    index,
                    message: err.to_string(),
                },
                Err(payload) => ThreadError::TaskPanicked {
                    index,
                    message: panic_message(payload.as_ref()),
                },
            };
            self.failed.store(true, Ordering::Release);
            let _ = self.tx_error.send(error);
            break;
        }

        if let Err(payload) = panic::catch_unwind(AssertUnwindSafe(|| task.cleanup(&worker))) {
            self.failed.store(true, Ordering::Release);
            let _ = self.tx_error.send(ThreadError::CleanupPanicked {
                worker: id,
                message: panic_message(payload.as_ref()),
            });
        }
    }
}

/// Extract a readable message from a panic payload.
///
/// * `payload` - The payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
