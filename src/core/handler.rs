//! Work function abstraction.

use std::future::Future;
use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;

/// The work function run for every admitted task.
///
/// The handler is shared by all tasks of a scheduler. The context is the
/// per-task value supplied at submission; it is the only mutable data the
/// scheduler hands out, so use interior mutability inside `C` if the
/// handler needs to write to it.
///
/// # Example
///
/// ```rust,ignore
/// use std::sync::Arc;
/// use async_trait::async_trait;
/// use prometheus_task_manager::core::TaskHandler;
///
/// struct Fetch;
///
/// #[async_trait]
/// impl TaskHandler<String, usize, ()> for Fetch {
///     async fn handle(&self, url: String, _ctx: Arc<()>) -> anyhow::Result<usize> {
///         Ok(url.len())
///     }
/// }
/// ```
#[async_trait]
pub trait TaskHandler<A, R, C>: Send + Sync + 'static
where
    A: Send + 'static,
    R: Send + 'static,
    C: Send + Sync + 'static,
{
    /// Perform the task's effect.
    ///
    /// Must settle eventually; without a configured deadline a handler that
    /// never returns holds its concurrency slot forever.
    async fn handle(&self, argument: A, context: Arc<C>) -> anyhow::Result<R>;
}

/// Adapter turning an async closure into a [`TaskHandler`].
pub struct FnHandler<F, A, R, C> {
    f: F,
    _marker: PhantomData<fn(A, Arc<C>) -> R>,
}

/// Wrap `f` as a [`TaskHandler`].
///
/// ```rust,ignore
/// let handler = handler_fn(|n: u64, _ctx: Arc<()>| async move { Ok(n * 2) });
/// ```
pub const fn handler_fn<F, Fut, A, R, C>(f: F) -> FnHandler<F, A, R, C>
where
    F: Fn(A, Arc<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
{
    FnHandler {
        f,
        _marker: PhantomData,
    }
}

#[async_trait]
impl<F, Fut, A, R, C> TaskHandler<A, R, C> for FnHandler<F, A, R, C>
where
    F: Fn(A, Arc<C>) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = anyhow::Result<R>> + Send + 'static,
    A: Send + 'static,
    R: Send + 'static,
    C: Send + Sync + 'static,
{
    async fn handle(&self, argument: A, context: Arc<C>) -> anyhow::Result<R> {
        (self.f)(argument, context).await
    }
}
