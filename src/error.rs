//! Error types for workq.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("unknown equal task action: {0}")]
    InvalidAction(String),

    #[error("telemetry error: {0}")]
    Telemetry(String),

    #[error("{0}")]
    Other(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Why a submitted task did not produce a value.
///
/// Every submitter sharing a completion handle receives the same
/// `TaskError`, so it is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskError<E> {
    /// The handler failed for this task.
    #[error("task handler failed: {0}")]
    Handler(E),

    /// Every handle to the queue was dropped while the task was still queued.
    #[error("queue dropped before the task was processed")]
    Abandoned,

    /// The `run` future was dropped while the handler was working on this
    /// task (a timeout, an aborted join handle, a losing `select!` branch).
    #[error("runner cancelled while processing the task")]
    RunnerCancelled,
}

impl<E> TaskError<E> {
    /// The handler's error, if that is why the task failed.
    pub fn handler_error(&self) -> Option<&E> {
        match self {
            TaskError::Handler(e) => Some(e),
            TaskError::Abandoned | TaskError::RunnerCancelled => None,
        }
    }
}
