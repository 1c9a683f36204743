//! Tests for scheduler builders

use std::future::Future;
use std::sync::Arc;

use prometheus_task_manager::builders::SchedulerBuilder;
use prometheus_task_manager::config::SchedulerConfig;
use prometheus_task_manager::core::{handler_fn, InMemoryEventLog, SchedulerError, Spawn};
use prometheus_task_manager::runtime::TokioSpawner;

#[derive(Clone)]
struct InlineTokioSpawner;

impl Spawn for InlineTokioSpawner {
    fn spawn<F>(&self, fut: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        tokio::spawn(fut);
    }
}

#[tokio::test]
async fn test_build_applies_config_and_observer() {
    let log = Arc::new(InMemoryEventLog::<u32, u32, ()>::new(16));
    let scheduler = SchedulerBuilder::new(handler_fn(|n: u32, _ctx: Arc<()>| async move {
        anyhow::Ok(n)
    }))
    .config(SchedulerConfig::new().with_concurrency(3))
    .observer(log.clone())
    .build()
    .unwrap();

    assert_eq!(scheduler.config().concurrency, 3);
    assert!(scheduler.enabled());
    scheduler.submit(1).unwrap().await.unwrap();
    assert_eq!(log.count("task-completed"), 1);
}

#[tokio::test]
async fn test_build_rejects_invalid_config() {
    let result = SchedulerBuilder::new(handler_fn(|n: u32, _ctx: Arc<()>| async move {
        anyhow::Ok(n)
    }))
    .config(SchedulerConfig::new().with_max_queue_size(0))
    .build();
    assert!(matches!(result, Err(SchedulerError::InvalidConfig(_))));
}

#[tokio::test]
async fn test_build_with_custom_spawner() {
    let scheduler = SchedulerBuilder::new(handler_fn(|n: u32, _ctx: Arc<()>| async move {
        anyhow::Ok(n * 3)
    }))
    .spawner(InlineTokioSpawner)
    .build_with_spawner()
    .unwrap();

    assert_eq!(scheduler.submit(3).unwrap().await.unwrap(), 9);
}

#[test]
fn test_build_with_explicit_tokio_spawner_outside_runtime() {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap();

    let scheduler = SchedulerBuilder::new(handler_fn(|n: u32, _ctx: Arc<()>| async move {
        anyhow::Ok(n)
    }))
    .spawner(TokioSpawner::new(runtime.handle().clone()))
    .build()
    .unwrap();

    let handle = scheduler.submit(8).unwrap();
    assert_eq!(runtime.block_on(handle).unwrap(), 8);
}
