//! Configuration models for the scheduler.

pub mod scheduler;

pub use scheduler::{SchedulerConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_QUEUE_SIZE};
