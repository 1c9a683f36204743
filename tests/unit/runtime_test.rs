//! Tests for runtime adapters

use prometheus_task_manager::core::{SchedulerError, Spawn};
use prometheus_task_manager::runtime::TokioSpawner;

#[tokio::test]
async fn test_tokio_spawner_runs_future() {
    let spawner = TokioSpawner::current().unwrap();
    let (tx, rx) = tokio::sync::oneshot::channel();
    spawner.spawn(async move {
        let _ = tx.send(7_u8);
    });
    assert_eq!(rx.await.unwrap(), 7);
}

#[test]
fn test_tokio_spawner_requires_runtime() {
    assert!(matches!(TokioSpawner::current(), Err(SchedulerError::Runtime(_))));
}
