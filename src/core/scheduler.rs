//! Bounded-concurrency task scheduler.
//!
//! Tasks flow pending queue → active set → gone. The dispatch loop promotes
//! queued tasks in FIFO order whenever the active set has free slots and the
//! scheduler is enabled. Each promoted task runs on the configured [`Spawn`]
//! implementation, optionally guarded by a watchdog that finalizes it once
//! its deadline elapses.
//!
//! All queue and active-set mutations happen under a single
//! `parking_lot::Mutex<SchedulerState>`. Each task record sits behind its own
//! mutex shared by the execution future and the watchdog; whichever claims
//! the outcome first wins and finalize runs exactly once. Observers and
//! callbacks always run after those locks are released.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, error, info, warn};

use crate::config::SchedulerConfig;
use crate::core::task::{TaskEntry, TaskRecord};
use crate::core::{
    AbortCallback, ErrorKind, EventObserver, SchedulerError, SchedulerEvent, Spawn, TaskError,
    TaskHandle, TaskHandler, TaskRequest, TaskView,
};
use crate::runtime::TokioSpawner;
use crate::util::clock::now_ms;
use crate::util::serde::TaskId;

/// Capacity of the broadcast channel backing [`TaskScheduler::subscribe`].
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Snapshot of scheduler counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Tasks currently waiting in the pending queue.
    pub queued_tasks: usize,
    /// Tasks currently executing.
    pub active_tasks: usize,
    /// Tasks admitted since construction.
    pub submitted_tasks: u64,
    /// Submissions rejected because the queue was full.
    pub rejected_tasks: u64,
    /// Tasks finalized with a result.
    pub completed_tasks: u64,
    /// Tasks finalized with an error other than a timeout.
    pub failed_tasks: u64,
    /// Tasks finalized by the watchdog.
    pub timed_out_tasks: u64,
    /// Work-function outcomes discarded because the task was already settled.
    pub late_settlements: u64,
}

#[derive(Debug, Default)]
struct SchedulerCounters {
    submitted: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    failed: AtomicU64,
    timed_out: AtomicU64,
    late: AtomicU64,
}

struct SchedulerState<A, R, C> {
    queue: VecDeque<TaskEntry<A, R, C>>,
    active: Vec<TaskEntry<A, R, C>>,
    last_id: TaskId,
    enabled: bool,
}

struct Inner<A, R, C, H, S> {
    config: SchedulerConfig,
    state: Mutex<SchedulerState<A, R, C>>,
    handler: H,
    spawner: S,
    observers: Vec<Arc<dyn EventObserver<A, R, C>>>,
    events_tx: broadcast::Sender<SchedulerEvent<A, R, C>>,
    counters: SchedulerCounters,
}

/// Bounded-concurrency scheduler running at most `concurrency` tasks at once.
///
/// Cheap to clone; clones share the same queue and active set.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use prometheus_task_manager::config::SchedulerConfig;
/// use prometheus_task_manager::core::{handler_fn, TaskScheduler};
///
/// let scheduler = TaskScheduler::new(
///     SchedulerConfig::new().with_concurrency(4),
///     handler_fn(|n: u64, _ctx: Arc<()>| async move { Ok(n * 2) }),
/// )?;
/// let doubled = scheduler.submit(21)?.await?;
/// ```
pub struct TaskScheduler<A, R, C, H, S = TokioSpawner> {
    inner: Arc<Inner<A, R, C, H, S>>,
}

impl<A, R, C, H, S> Clone for TaskScheduler<A, R, C, H, S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<A, R, C, H> TaskScheduler<A, R, C, H, TokioSpawner>
where
    A: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    C: Default + Send + Sync + 'static,
    H: TaskHandler<A, R, C>,
{
    /// Create a scheduler spawning onto the current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if validation fails, or `Runtime` when called
    /// outside a tokio runtime.
    pub fn new(config: SchedulerConfig, handler: H) -> Result<Self, SchedulerError> {
        Self::with_spawner(config, handler, TokioSpawner::current()?)
    }
}

impl<A, R, C, H, S> TaskScheduler<A, R, C, H, S>
where
    A: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    C: Default + Send + Sync + 'static,
    H: TaskHandler<A, R, C>,
    S: Spawn,
{
    /// Create a scheduler with an explicit spawner.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if validation fails.
    pub fn with_spawner(
        config: SchedulerConfig,
        handler: H,
        spawner: S,
    ) -> Result<Self, SchedulerError> {
        Self::from_parts(config, handler, spawner, Vec::new())
    }

    pub(crate) fn from_parts(
        config: SchedulerConfig,
        handler: H,
        spawner: S,
        observers: Vec<Arc<dyn EventObserver<A, R, C>>>,
    ) -> Result<Self, SchedulerError> {
        config.validate().map_err(SchedulerError::InvalidConfig)?;
        let (events_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Ok(Self {
            inner: Arc::new(Inner {
                config,
                state: Mutex::new(SchedulerState {
                    queue: VecDeque::new(),
                    active: Vec::new(),
                    last_id: 0,
                    enabled: true,
                }),
                handler,
                spawner,
                observers,
                events_tx,
                counters: SchedulerCounters::default(),
            }),
        })
    }

    /// Submit a task with a default context and no abort callback.
    ///
    /// # Errors
    ///
    /// Returns `QueueFull` when the pending queue is at capacity.
    pub fn submit(&self, argument: A) -> Result<TaskHandle<R>, SchedulerError> {
        self.submit_request(TaskRequest::new(argument))
    }

    /// Submit a task carrying an optional context and abort callback.
    ///
    /// On success the task is queued, `task-queued` is emitted, and the
    /// dispatch loop runs before this returns. The returned handle resolves
    /// once the task is finalized.
    ///
    /// # Errors
    ///
    /// Returns `QueueFull` when the pending queue is at capacity. Nothing is
    /// enqueued and no id is consumed in that case.
    pub fn submit_request(
        &self,
        request: TaskRequest<A, R, C>,
    ) -> Result<TaskHandle<R>, SchedulerError> {
        let TaskRequest {
            argument,
            context,
            abort_callback,
        } = request;
        let (settle_tx, settle_rx) = oneshot::channel();

        let mut state = self.inner.state.lock();
        let max_queue_size = self.inner.config.max_queue_size;
        if state.queue.len() >= max_queue_size {
            drop(state);
            self.inner.counters.rejected.fetch_add(1, Ordering::Relaxed);
            warn!(max_queue_size, "task rejected: queue full");
            return Err(SchedulerError::QueueFull { max_queue_size });
        }

        state.last_id += 1;
        let id = state.last_id;
        let entry = TaskEntry::new(
            id,
            TaskRecord::new(
                id,
                argument,
                context.unwrap_or_default(),
                abort_callback,
                settle_tx,
            ),
        );
        state.queue.push_back(entry.clone());
        let queued = state.queue.len();
        drop(state);

        let view = entry.record.lock().view();

        self.inner.counters.submitted.fetch_add(1, Ordering::Relaxed);
        info!(task_id = id, queued, "task queued");
        self.emit(SchedulerEvent::TaskQueued(view));
        // Execution waits on this, so task-starting cannot overtake task-queued.
        entry.mark_queued();

        self.dispatch();
        Ok(TaskHandle::new(id, settle_rx))
    }

    /// Resume promotion of queued tasks and dispatch immediately.
    pub fn enable(&self) {
        self.inner.state.lock().enabled = true;
        info!("scheduler enabled");
        self.dispatch();
    }

    /// Stop promoting queued tasks. Active tasks keep running and admission
    /// keeps accepting.
    pub fn disable(&self) {
        self.inner.state.lock().enabled = false;
        info!("scheduler disabled");
    }

    /// Subscribe to lifecycle events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SchedulerEvent<A, R, C>> {
        self.inner.events_tx.subscribe()
    }

    /// Snapshot of scheduler counters.
    #[must_use]
    pub fn stats(&self) -> SchedulerStats {
        let (queued_tasks, active_tasks) = {
            let state = self.inner.state.lock();
            (state.queue.len(), state.active.len())
        };
        let counters = &self.inner.counters;
        SchedulerStats {
            queued_tasks,
            active_tasks,
            submitted_tasks: counters.submitted.load(Ordering::Relaxed),
            rejected_tasks: counters.rejected.load(Ordering::Relaxed),
            completed_tasks: counters.completed.load(Ordering::Relaxed),
            failed_tasks: counters.failed.load(Ordering::Relaxed),
            timed_out_tasks: counters.timed_out.load(Ordering::Relaxed),
            late_settlements: counters.late.load(Ordering::Relaxed),
        }
    }

    /// Promote queued tasks into free active slots, preserving FIFO order.
    fn dispatch(&self) {
        let promoted: Vec<TaskEntry<A, R, C>> = {
            let mut state = self.inner.state.lock();
            if !state.enabled {
                return;
            }
            let concurrency = self.inner.config.concurrency;
            if state.active.len() >= concurrency {
                return;
            }
            let slots = concurrency - state.active.len();
            let take = slots.min(state.queue.len());
            let promoted: Vec<_> = state.queue.drain(..take).collect();
            state.active.extend(promoted.iter().cloned());
            promoted
        };

        if !promoted.is_empty() {
            debug!(count = promoted.len(), "promoting queued tasks");
        }
        for entry in promoted {
            let this = self.clone();
            self.inner.spawner.spawn(async move { this.execute(entry).await });
        }
    }

    /// Run one promoted task through to finalize.
    async fn execute(self, entry: TaskEntry<A, R, C>) {
        entry.queued.notified().await;
        let (argument, context, view) = {
            let mut record = entry.record.lock();
            record.started_at_ms = Some(now_ms());
            (
                record.argument.clone(),
                Arc::clone(&record.context),
                record.view(),
            )
        };
        info!(task_id = entry.id, "task starting");
        self.emit(SchedulerEvent::TaskStarting(view));

        let watchdog = self.arm_watchdog(&entry);
        // `handle` itself may panic before returning a future.
        let handler = &self.inner.handler;
        let settled = AssertUnwindSafe(async move { handler.handle(argument, context).await })
            .catch_unwind()
            .await;
        drop(watchdog);

        let outcome = match settled {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(err)) => Err(TaskError::from(err)),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!(task_id = entry.id, %message, "task execution fault");
                let view = entry.record.lock().view();
                self.emit_error(ErrorKind::TaskExecution, message.clone(), view);
                Err(TaskError::Execution(message))
            }
        };

        let claimed = entry.record.lock().claim(outcome);
        if !claimed {
            self.inner.counters.late.fetch_add(1, Ordering::Relaxed);
            debug!(task_id = entry.id, "late settlement ignored");
        }
        self.finalize(&entry);
    }

    /// Start the deadline timer for `entry`. Dropping the returned sender
    /// disarms it.
    fn arm_watchdog(&self, entry: &TaskEntry<A, R, C>) -> Option<oneshot::Sender<()>> {
        let limit = self.inner.config.task_max_execution_time?;
        let deadline = tokio::time::Instant::now() + limit;
        let (disarm_tx, disarm_rx) = oneshot::channel::<()>();
        let this = self.clone();
        let entry = entry.clone();
        self.inner.spawner.spawn(async move {
            tokio::select! {
                () = tokio::time::sleep_until(deadline) => this.on_timeout(&entry, limit),
                _ = disarm_rx => debug!(task_id = entry.id, "watchdog disarmed"),
            }
        });
        Some(disarm_tx)
    }

    fn on_timeout(&self, entry: &TaskEntry<A, R, C>, limit: Duration) {
        let reason = TaskError::Timeout { limit };
        let (callback, view) = {
            let mut record = entry.record.lock();
            if !record.claim(Err(reason.clone())) {
                return;
            }
            (record.abort_callback.take(), record.view())
        };
        warn!(task_id = entry.id, ?limit, "task execution timeout");
        self.abort(callback, &view, &reason);
        self.finalize(entry);
    }

    /// Tell the work function it has been superseded. Callback faults are
    /// reported as events and never propagate.
    fn abort(
        &self,
        callback: Option<AbortCallback<A, R, C>>,
        view: &TaskView<A, R, C>,
        reason: &TaskError,
    ) {
        let Some(callback) = callback else {
            return;
        };
        let message = match std::panic::catch_unwind(AssertUnwindSafe(|| callback(view, reason))) {
            Ok(Ok(())) => return,
            Ok(Err(err)) => format!("unable to abort task: {err}"),
            Err(panic) => format!("unable to abort task: {}", panic_message(panic.as_ref())),
        };
        error!(task_id = view.id, %message, "abort callback failed");
        self.emit_error(ErrorKind::TaskAbort, message, view.clone());
    }

    /// Terminal transition. Runs at most once per task.
    fn finalize(&self, entry: &TaskEntry<A, R, C>) {
        let (view, settle, outcome) = {
            let mut record = entry.record.lock();
            if record.completed_at_ms.is_some() {
                return;
            }
            record.completed_at_ms = Some(now_ms());
            (record.view(), record.settle.take(), record.outcome.clone())
        };

        let counters = &self.inner.counters;
        match &outcome {
            Some(Ok(_)) => counters.completed.fetch_add(1, Ordering::Relaxed),
            Some(Err(err)) if err.is_timeout() => counters.timed_out.fetch_add(1, Ordering::Relaxed),
            Some(Err(_)) | None => counters.failed.fetch_add(1, Ordering::Relaxed),
        };
        info!(task_id = entry.id, ok = view.error.is_none(), "task completed");
        self.emit(SchedulerEvent::TaskCompleted(view.clone()));

        let removed = {
            let mut state = self.inner.state.lock();
            match state.active.iter().position(|active| active.id == entry.id) {
                Some(index) => {
                    state.active.remove(index);
                    true
                }
                None => false,
            }
        };
        if !removed {
            error!(task_id = entry.id, "task missing from active set during finalize");
            self.emit_error(
                ErrorKind::InternalInvariant,
                "task missing from active set during finalize".into(),
                view,
            );
        }

        if let (Some(settle), Some(outcome)) = (settle, outcome) {
            // Receiver gone means the caller dropped its handle.
            let _ = settle.send(outcome);
        }

        self.dispatch();
    }

    fn emit_error(&self, kind: ErrorKind, message: String, task: TaskView<A, R, C>) {
        self.emit(SchedulerEvent::Error {
            kind,
            message,
            task,
        });
    }

    fn emit(&self, event: SchedulerEvent<A, R, C>) {
        for observer in &self.inner.observers {
            if std::panic::catch_unwind(AssertUnwindSafe(|| observer.on_event(&event))).is_err() {
                error!(event = event.name(), "event observer panicked");
            }
        }
        // No subscribers is not an error.
        let _ = self.inner.events_tx.send(event);
    }
}

impl<A, R, C, H, S> TaskScheduler<A, R, C, H, S> {
    /// Number of tasks waiting in the pending queue.
    #[must_use]
    pub fn queued_count(&self) -> usize {
        self.inner.state.lock().queue.len()
    }

    /// Number of tasks currently executing.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.state.lock().active.len()
    }

    /// Whether the dispatch loop is promoting tasks.
    #[must_use]
    pub fn enabled(&self) -> bool {
        self.inner.state.lock().enabled
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &SchedulerConfig {
        &self.inner.config
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "task panicked".to_string())
}
