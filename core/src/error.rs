//! Errors

use thiserror::Error;

/// Error returned by a task body. Any error type can be boxed into it with `?`.
pub type TaskError = Box<dyn std::error::Error + Send + Sync>;

/// Errors raised by `ResourcePool`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PoolError {
    /// The factory could not construct a new pooled instance.
    #[error("unable to construct pooled {type_name}: {message}")]
    Construction {
        /// Name of the pooled type.
        type_name: &'static str,

        /// What the factory reported.
        message: String,
    },
}

/// Errors raised by `ThreadManager`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ThreadError {
    /// A task returned an error; dispatch was stopped.
    #[error("task failed at index {index}: {message}")]
    TaskFailed {
        /// Index whose execution failed.
        index: usize,

        /// Error message.
        message: String,
    },

    /// A task panicked; dispatch was stopped.
    #[error("task panicked at index {index}: {message}")]
    TaskPanicked {
        /// Index whose execution panicked.
        index: usize,

        /// Panic payload, if it was a string.
        message: String,
    },

    /// A task's per-worker cleanup panicked.
    #[error("cleanup panicked on worker {worker}: {message}")]
    CleanupPanicked {
        /// Worker whose cleanup panicked.
        worker: usize,

        /// Panic payload, if it was a string.
        message: String,
    },

    /// `run` was called while the manager was already running.
    #[error("thread manager is already running")]
    AlreadyRunning,

    /// `run` was called before a task was set.
    #[error("no task has been set")]
    NoTask,

    /// A worker thread could not be spawned.
    #[error("unable to spawn worker thread: {0}")]
    Spawn(String),
}

/// Errors raised while emitting photons.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PhotonError {
    /// Parallel emission failed.
    #[error(transparent)]
    Thread(#[from] ThreadError),

    /// Scratch storage could not be allocated.
    #[error(transparent)]
    Pool(#[from] PoolError),
}

/// Errors raised by the SVD solver.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SvdError {
    /// The matrix has fewer rows than columns.
    #[error("matrix has {rows} rows but {cols} columns; need rows >= cols")]
    NotEnoughRows {
        /// Row count.
        rows: usize,

        /// Column count.
        cols: usize,
    },

    /// The right hand side does not match the matrix.
    #[error("right hand side has {got} entries, expected {expected}")]
    DimensionMismatch {
        /// Expected length.
        expected: usize,

        /// Actual length.
        got: usize,
    },
}
