//! Lifecycle events and observer sinks.
//!
//! Events are delivered to registered [`EventObserver`]s synchronously on the
//! thread that produced them, and to broadcast subscribers obtained through
//! [`TaskScheduler::subscribe`](crate::core::TaskScheduler::subscribe).

use std::collections::VecDeque;

use parking_lot::Mutex;

use crate::core::{ErrorKind, TaskView};

/// Lifecycle notification emitted by the scheduler.
pub enum SchedulerEvent<A, R, C> {
    /// Task admitted to the pending queue.
    TaskQueued(TaskView<A, R, C>),
    /// Task about to invoke the work function.
    TaskStarting(TaskView<A, R, C>),
    /// Task finalized; emitted exactly once per admitted task.
    TaskCompleted(TaskView<A, R, C>),
    /// Scheduler-internal fault that was contained instead of propagated.
    Error {
        /// Fault classification.
        kind: ErrorKind,
        /// Human-readable detail.
        message: String,
        /// Task the fault relates to.
        task: TaskView<A, R, C>,
    },
}

impl<A, R, C> SchedulerEvent<A, R, C> {
    /// Wire name of the event.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::TaskQueued(_) => "task-queued",
            Self::TaskStarting(_) => "task-starting",
            Self::TaskCompleted(_) => "task-completed",
            Self::Error { .. } => "error",
        }
    }

    /// Task view carried by the event.
    #[must_use]
    pub const fn task(&self) -> &TaskView<A, R, C> {
        match self {
            Self::TaskQueued(task)
            | Self::TaskStarting(task)
            | Self::TaskCompleted(task)
            | Self::Error { task, .. } => task,
        }
    }

    /// Error kind, for `error` events.
    #[must_use]
    pub const fn error_kind(&self) -> Option<ErrorKind> {
        match self {
            Self::Error { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl<A: Clone, R: Clone, C> Clone for SchedulerEvent<A, R, C> {
    fn clone(&self) -> Self {
        match self {
            Self::TaskQueued(task) => Self::TaskQueued(task.clone()),
            Self::TaskStarting(task) => Self::TaskStarting(task.clone()),
            Self::TaskCompleted(task) => Self::TaskCompleted(task.clone()),
            Self::Error {
                kind,
                message,
                task,
            } => Self::Error {
                kind: *kind,
                message: message.clone(),
                task: task.clone(),
            },
        }
    }
}

impl<A: std::fmt::Debug, R: std::fmt::Debug, C> std::fmt::Debug for SchedulerEvent<A, R, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error {
                kind,
                message,
                task,
            } => f
                .debug_struct("Error")
                .field("kind", kind)
                .field("message", message)
                .field("task", task)
                .finish(),
            other => f
                .debug_tuple(other.name())
                .field(other.task())
                .finish(),
        }
    }
}

/// Receiver of scheduler lifecycle events.
///
/// Called without any scheduler lock held. A panic inside `on_event` is
/// caught and logged; it does not disturb the scheduler.
pub trait EventObserver<A, R, C>: Send + Sync {
    /// Handle one event.
    fn on_event(&self, event: &SchedulerEvent<A, R, C>);
}

/// Bounded in-memory event log for testing and dev.
pub struct InMemoryEventLog<A, R, C> {
    events: Mutex<VecDeque<SchedulerEvent<A, R, C>>>,
    max_events: usize,
}

impl<A: Clone, R: Clone, C> InMemoryEventLog<A, R, C> {
    /// Create a log that keeps at most `max_events` recent events.
    #[must_use]
    pub fn new(max_events: usize) -> Self {
        Self {
            events: Mutex::new(VecDeque::with_capacity(max_events.min(1024))),
            max_events,
        }
    }

    /// Snapshot of stored events, oldest first.
    pub fn events(&self) -> Vec<SchedulerEvent<A, R, C>> {
        self.events.lock().iter().cloned().collect()
    }

    /// Names of stored events, oldest first.
    pub fn names(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(SchedulerEvent::name).collect()
    }

    /// Number of stored events with the given name.
    pub fn count(&self, name: &str) -> usize {
        self.events.lock().iter().filter(|e| e.name() == name).count()
    }

    /// Stored `error` events matching `kind`.
    pub fn errors_of(&self, kind: ErrorKind) -> Vec<SchedulerEvent<A, R, C>> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.error_kind() == Some(kind))
            .cloned()
            .collect()
    }
}

impl<A, R, C> EventObserver<A, R, C> for InMemoryEventLog<A, R, C>
where
    A: Clone + Send + Sync,
    R: Clone + Send + Sync,
    C: Send + Sync,
{
    fn on_event(&self, event: &SchedulerEvent<A, R, C>) {
        let mut events = self.events.lock();
        if events.len() >= self.max_events {
            events.pop_front();
        }
        events.push_back(event.clone());
    }
}

/// Observer that writes each event to `tracing` at debug level.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl<A, R, C> EventObserver<A, R, C> for TracingObserver {
    fn on_event(&self, event: &SchedulerEvent<A, R, C>) {
        let task = event.task();
        match event.error_kind() {
            Some(kind) => tracing::debug!(task_id = task.id, ?kind, "scheduler event: error"),
            None => tracing::debug!(task_id = task.id, "scheduler event: {}", event.name()),
        }
    }
}
