//! Runtime spawning abstraction.

use std::future::Future;

/// Abstraction for spawning task execution on a runtime.
///
/// The scheduler never runs a promoted task on the dispatching call stack;
/// every execution and every watchdog goes through `spawn`.
pub trait Spawn: Send + Sync + 'static {
    /// Spawn a detached future.
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static;
}
