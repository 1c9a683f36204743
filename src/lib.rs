//! # Prometheus Task Manager
//!
//! A bounded-concurrency task scheduler for async workloads.
//!
//! Callers submit work items; the scheduler queues them and runs at most N
//! at once, enforces an optional per-task execution deadline, emits
//! lifecycle events, and can pause and resume dispatch at runtime.
//!
//! ## Key Features
//!
//! - **Concurrency gate**: never more than `concurrency` tasks in flight
//! - **Bounded FIFO queue**: admission fails fast with `QueueFull` once
//!   `max_queue_size` tasks are waiting
//! - **Watchdog**: optional deadline per task, with an advisory abort callback
//! - **Exactly-once completion**: a timeout racing a natural completion
//!   settles the task once and emits one `task-completed`
//! - **Fault isolation**: abort-callback, observer, and work-function panics
//!   are reported as `error` events instead of tearing down the scheduler
//! - **Pause/resume**: `disable()` stops promotion, `enable()` resumes it
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use std::time::Duration;
//! use prometheus_task_manager::builders::SchedulerBuilder;
//! use prometheus_task_manager::config::SchedulerConfig;
//! use prometheus_task_manager::core::{handler_fn, InMemoryEventLog, TaskRequest};
//!
//! let log = Arc::new(InMemoryEventLog::new(1024));
//! let scheduler = SchedulerBuilder::new(handler_fn(|url: String, _ctx: Arc<()>| async move {
//!     Ok(url.len())
//! }))
//! .config(
//!     SchedulerConfig::new()
//!         .with_concurrency(4)
//!         .with_task_max_execution_time(Duration::from_secs(30)),
//! )
//! .observer(log.clone())
//! .build()?;
//!
//! let handle = scheduler.submit_request(
//!     TaskRequest::new("https://example.com".to_string())
//!         .with_abort_callback(|task, reason| {
//!             tracing::warn!(task_id = task.id, %reason, "giving up");
//!             Ok(())
//!         }),
//! )?;
//! let len = handle.await?;
//! ```
//!
//! For complete examples, see `tests/scheduler_test.rs`.

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Core scheduling abstractions: scheduler, task records, events, errors.
pub mod core;
/// Configuration models and loaders.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Runtime adapters.
pub mod runtime;
/// Shared utilities.
pub mod util;
