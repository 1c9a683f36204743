//! Builder assembling a [`TaskScheduler`] from configuration, a handler,
//! observers, and an optional spawner.

use std::sync::Arc;

use crate::config::SchedulerConfig;
use crate::core::{EventObserver, SchedulerError, Spawn, TaskHandler, TaskScheduler};
use crate::runtime::TokioSpawner;

/// Builder for [`TaskScheduler`].
///
/// ```rust,ignore
/// let log = Arc::new(InMemoryEventLog::new(256));
/// let scheduler = SchedulerBuilder::new(handler)
///     .config(SchedulerConfig::from_env()?)
///     .observer(log.clone())
///     .build()?;
/// ```
pub struct SchedulerBuilder<A, R, C, H, S = TokioSpawner> {
    config: SchedulerConfig,
    handler: H,
    spawner: Option<S>,
    observers: Vec<Arc<dyn EventObserver<A, R, C>>>,
}

impl<A, R, C, H> SchedulerBuilder<A, R, C, H, TokioSpawner>
where
    A: Send + 'static,
    R: Send + 'static,
    C: Send + Sync + 'static,
    H: TaskHandler<A, R, C>,
{
    /// Start a builder with default configuration.
    pub fn new(handler: H) -> Self {
        Self {
            config: SchedulerConfig::default(),
            handler,
            spawner: None,
            observers: Vec::new(),
        }
    }
}

impl<A, R, C, H, S> SchedulerBuilder<A, R, C, H, S> {
    /// Replace the configuration.
    #[must_use]
    pub fn config(mut self, config: SchedulerConfig) -> Self {
        self.config = config;
        self
    }

    /// Register an event observer. Observers are invoked in registration order.
    #[must_use]
    pub fn observer<O>(mut self, observer: Arc<O>) -> Self
    where
        O: EventObserver<A, R, C> + 'static,
    {
        self.observers.push(observer);
        self
    }

    /// Use a custom spawner instead of the current tokio runtime.
    pub fn spawner<S2: Spawn>(self, spawner: S2) -> SchedulerBuilder<A, R, C, H, S2> {
        SchedulerBuilder {
            config: self.config,
            handler: self.handler,
            spawner: Some(spawner),
            observers: self.observers,
        }
    }
}

impl<A, R, C, H, S> SchedulerBuilder<A, R, C, H, S>
where
    A: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    C: Default + Send + Sync + 'static,
    H: TaskHandler<A, R, C>,
    S: Spawn,
{
    /// Build the scheduler with the configured spawner.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if validation fails, or `Runtime` if no spawner
    /// was set.
    pub fn build_with_spawner(self) -> Result<TaskScheduler<A, R, C, H, S>, SchedulerError> {
        let spawner = self
            .spawner
            .ok_or_else(|| SchedulerError::Runtime("no spawner configured".into()))?;
        TaskScheduler::from_parts(self.config, self.handler, spawner, self.observers)
    }
}

impl<A, R, C, H> SchedulerBuilder<A, R, C, H, TokioSpawner>
where
    A: Clone + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
    C: Default + Send + Sync + 'static,
    H: TaskHandler<A, R, C>,
{
    /// Build the scheduler, spawning onto the current tokio runtime unless a
    /// [`TokioSpawner`] was supplied.
    ///
    /// # Errors
    ///
    /// Returns `InvalidConfig` if validation fails, or `Runtime` when called
    /// outside a tokio runtime without an explicit spawner.
    pub fn build(self) -> Result<TaskScheduler<A, R, C, H>, SchedulerError> {
        let spawner = match self.spawner {
            Some(spawner) => spawner,
            None => TokioSpawner::current()?,
        };
        TaskScheduler::from_parts(self.config, self.handler, spawner, self.observers)
    }
}
