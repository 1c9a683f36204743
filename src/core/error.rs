//! Error types for scheduler operations.

use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Classification of every fault the scheduler can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Admission rejected because the pending queue is at capacity.
    QueueFull,
    /// Task deadline elapsed before the work function settled.
    TaskTimeout,
    /// The work function faulted while being started or polled.
    TaskExecution,
    /// The abort callback itself failed.
    TaskAbort,
    /// Active-set bookkeeping inconsistency. Indicates a scheduler bug.
    InternalInvariant,
}

/// Errors returned synchronously by scheduler construction and admission.
#[derive(Debug, Error)]
pub enum SchedulerError {
    /// Pending queue is full.
    #[error("queue full: max queue size {max_queue_size} reached")]
    QueueFull {
        /// Configured maximum queue size.
        max_queue_size: usize,
    },
    /// Configuration failed validation.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// No async runtime available to spawn onto.
    #[error("runtime error: {0}")]
    Runtime(String),
}

impl SchedulerError {
    /// Kind tag for this error, if it belongs to the task taxonomy.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::QueueFull { .. } => Some(ErrorKind::QueueFull),
            Self::InvalidConfig(_) | Self::Runtime(_) => None,
        }
    }
}

/// Terminal failure of a single admitted task.
///
/// This is the error half of a [`TaskHandle`](crate::core::TaskHandle) output
/// and of [`TaskView::error`](crate::core::TaskView).
#[derive(Debug, Clone, Error)]
pub enum TaskError {
    /// Deadline elapsed before the work function settled.
    #[error("task execution timeout after {limit:?}")]
    Timeout {
        /// Configured execution limit.
        limit: Duration,
    },
    /// The work function returned an error.
    #[error("{0}")]
    Failed(Arc<anyhow::Error>),
    /// The work function panicked.
    #[error("task execution fault: {0}")]
    Execution(String),
    /// The scheduler went away before the task settled.
    #[error("task cancelled before completion")]
    Cancelled,
}

impl TaskError {
    /// Kind tag, if this failure is a scheduler-raised one.
    ///
    /// Errors produced by the work function itself carry no kind.
    #[must_use]
    pub const fn kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Timeout { .. } => Some(ErrorKind::TaskTimeout),
            Self::Execution(_) => Some(ErrorKind::TaskExecution),
            Self::Failed(_) | Self::Cancelled => None,
        }
    }

    /// Returns true if this is a deadline failure.
    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

impl From<anyhow::Error> for TaskError {
    fn from(err: anyhow::Error) -> Self {
        Self::Failed(Arc::new(err))
    }
}

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
