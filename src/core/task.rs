//! Task records, the external task view, and the caller-facing handle.

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use parking_lot::Mutex;
use tokio::sync::{oneshot, Notify};

use crate::core::TaskError;
use crate::util::clock::now_ms;
use crate::util::serde::TaskId;

/// Callback invoked when a task is superseded by its deadline.
///
/// Receives the task view (context included) and the triggering error.
/// Returning `Err` or panicking is reported as a `TaskAbort` event and
/// never reaches the task's handle.
pub type AbortCallback<A, R, C> =
    Box<dyn FnOnce(&TaskView<A, R, C>, &TaskError) -> anyhow::Result<()> + Send + 'static>;

/// Externally visible snapshot of a task.
pub struct TaskView<A, R, C> {
    /// Task identifier.
    pub id: TaskId,
    /// Argument handed to the work function.
    pub argument: A,
    /// Caller-supplied context shared with the work function.
    pub context: Arc<C>,
    /// Admission time, ms since epoch.
    pub queued_at_ms: u128,
    /// Execution start time, ms since epoch.
    pub started_at_ms: Option<u128>,
    /// Finalize time, ms since epoch.
    pub completed_at_ms: Option<u128>,
    /// Successful result. Never set together with `error`.
    pub result: Option<R>,
    /// Failure. Never set together with `result`.
    pub error: Option<TaskError>,
}

impl<A: Clone, R: Clone, C> Clone for TaskView<A, R, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            argument: self.argument.clone(),
            context: Arc::clone(&self.context),
            queued_at_ms: self.queued_at_ms,
            started_at_ms: self.started_at_ms,
            completed_at_ms: self.completed_at_ms,
            result: self.result.clone(),
            error: self.error.clone(),
        }
    }
}

impl<A: fmt::Debug, R: fmt::Debug, C> fmt::Debug for TaskView<A, R, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskView")
            .field("id", &self.id)
            .field("argument", &self.argument)
            .field("queued_at_ms", &self.queued_at_ms)
            .field("started_at_ms", &self.started_at_ms)
            .field("completed_at_ms", &self.completed_at_ms)
            .field("result", &self.result)
            .field("error", &self.error)
            .finish_non_exhaustive()
    }
}

/// A submission with optional context and abort callback.
pub struct TaskRequest<A, R, C> {
    pub(crate) argument: A,
    pub(crate) context: Option<C>,
    pub(crate) abort_callback: Option<AbortCallback<A, R, C>>,
}

impl<A, R, C> TaskRequest<A, R, C> {
    /// Create a request carrying only an argument.
    pub const fn new(argument: A) -> Self {
        Self {
            argument,
            context: None,
            abort_callback: None,
        }
    }

    /// Attach a context value passed to the work function and abort callback.
    #[must_use]
    pub fn with_context(mut self, context: C) -> Self {
        self.context = Some(context);
        self
    }

    /// Attach an abort callback run when the task times out.
    #[must_use]
    pub fn with_abort_callback<F>(mut self, callback: F) -> Self
    where
        F: FnOnce(&TaskView<A, R, C>, &TaskError) -> anyhow::Result<()> + Send + 'static,
    {
        self.abort_callback = Some(Box::new(callback));
        self
    }
}

/// Scheduler-private task state.
pub(crate) struct TaskRecord<A, R, C> {
    pub id: TaskId,
    pub argument: A,
    pub context: Arc<C>,
    pub queued_at_ms: u128,
    pub started_at_ms: Option<u128>,
    pub completed_at_ms: Option<u128>,
    pub outcome: Option<Result<R, TaskError>>,
    pub abort_callback: Option<AbortCallback<A, R, C>>,
    pub settle: Option<oneshot::Sender<Result<R, TaskError>>>,
}

impl<A: Clone, R: Clone, C> TaskRecord<A, R, C> {
    pub fn new(
        id: TaskId,
        argument: A,
        context: C,
        abort_callback: Option<AbortCallback<A, R, C>>,
        settle: oneshot::Sender<Result<R, TaskError>>,
    ) -> Self {
        Self {
            id,
            argument,
            context: Arc::new(context),
            queued_at_ms: now_ms(),
            started_at_ms: None,
            completed_at_ms: None,
            outcome: None,
            abort_callback,
            settle: Some(settle),
        }
    }

    /// Record the terminal outcome if none has been claimed yet.
    ///
    /// Returns false when another path already claimed the task.
    pub fn claim(&mut self, outcome: Result<R, TaskError>) -> bool {
        if self.outcome.is_some() || self.completed_at_ms.is_some() {
            return false;
        }
        self.outcome = Some(outcome);
        true
    }

    pub fn view(&self) -> TaskView<A, R, C> {
        let (result, error) = match &self.outcome {
            Some(Ok(r)) => (Some(r.clone()), None),
            Some(Err(e)) => (None, Some(e.clone())),
            None => (None, None),
        };
        TaskView {
            id: self.id,
            argument: self.argument.clone(),
            context: Arc::clone(&self.context),
            queued_at_ms: self.queued_at_ms,
            started_at_ms: self.started_at_ms,
            completed_at_ms: self.completed_at_ms,
            result,
            error,
        }
    }
}

/// Shared reference to a task record, held by the queue or active set,
/// the execution future, and the watchdog.
pub(crate) struct TaskEntry<A, R, C> {
    pub id: TaskId,
    pub record: Arc<Mutex<TaskRecord<A, R, C>>>,
    /// Signalled once `task-queued` has been emitted; execution waits on it.
    pub queued: Arc<Notify>,
}

impl<A, R, C> TaskEntry<A, R, C> {
    pub fn new(id: TaskId, record: TaskRecord<A, R, C>) -> Self {
        Self {
            id,
            record: Arc::new(Mutex::new(record)),
            queued: Arc::new(Notify::new()),
        }
    }

    /// Release the execution path. Stores a permit if nothing waits yet.
    pub fn mark_queued(&self) {
        self.queued.notify_one();
    }
}

impl<A, R, C> Clone for TaskEntry<A, R, C> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            record: Arc::clone(&self.record),
            queued: Arc::clone(&self.queued),
        }
    }
}

/// Future returned by a successful submission.
///
/// Resolves with the work function's result, its error, a timeout, or
/// [`TaskError::Cancelled`] if the scheduler is dropped first.
#[derive(Debug)]
pub struct TaskHandle<R> {
    id: TaskId,
    rx: oneshot::Receiver<Result<R, TaskError>>,
}

impl<R> TaskHandle<R> {
    pub(crate) const fn new(id: TaskId, rx: oneshot::Receiver<Result<R, TaskError>>) -> Self {
        Self { id, rx }
    }

    /// Identifier assigned to the task at admission.
    #[must_use]
    pub const fn id(&self) -> TaskId {
        self.id
    }
}

impl<R> Future for TaskHandle<R> {
    type Output = Result<R, TaskError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|settled| settled.unwrap_or(Err(TaskError::Cancelled)))
    }
}
