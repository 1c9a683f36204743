//! Core scheduling abstractions: the scheduler, task records, events, and errors.

pub mod error;
pub mod events;
pub mod handler;
pub mod scheduler;
pub mod spawn;
pub mod task;

pub use error::{AppResult, ErrorKind, SchedulerError, TaskError};
pub use events::{EventObserver, InMemoryEventLog, SchedulerEvent, TracingObserver};
pub use handler::{handler_fn, FnHandler, TaskHandler};
pub use scheduler::{SchedulerStats, TaskScheduler, EVENT_CHANNEL_CAPACITY};
pub use spawn::Spawn;
pub use task::{AbortCallback, TaskHandle, TaskRequest, TaskView};
