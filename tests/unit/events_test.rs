//! Tests for lifecycle events and the in-memory event log

use std::sync::Arc;

use prometheus_task_manager::core::{
    ErrorKind, EventObserver, InMemoryEventLog, SchedulerEvent, TaskError, TaskView,
};

fn view(id: u64) -> TaskView<String, u32, ()> {
    TaskView {
        id,
        argument: format!("task-{id}"),
        context: Arc::new(()),
        queued_at_ms: 100,
        started_at_ms: None,
        completed_at_ms: None,
        result: None,
        error: None,
    }
}

#[test]
fn test_event_names() {
    assert_eq!(SchedulerEvent::TaskQueued(view(1)).name(), "task-queued");
    assert_eq!(SchedulerEvent::TaskStarting(view(1)).name(), "task-starting");
    assert_eq!(SchedulerEvent::TaskCompleted(view(1)).name(), "task-completed");

    let error = SchedulerEvent::Error {
        kind: ErrorKind::TaskAbort,
        message: "unable to abort task".into(),
        task: view(2),
    };
    assert_eq!(error.name(), "error");
    assert_eq!(error.error_kind(), Some(ErrorKind::TaskAbort));
    assert_eq!(error.task().id, 2);
}

#[test]
fn test_event_log_is_bounded() {
    let log = InMemoryEventLog::new(2);
    for id in 1..=3 {
        log.on_event(&SchedulerEvent::TaskQueued(view(id)));
    }
    let ids: Vec<u64> = log.events().iter().map(|e| e.task().id).collect();
    assert_eq!(ids, vec![2, 3]);
}

#[test]
fn test_event_log_filters() {
    let log = InMemoryEventLog::new(16);
    log.on_event(&SchedulerEvent::TaskQueued(view(1)));
    log.on_event(&SchedulerEvent::TaskStarting(view(1)));
    log.on_event(&SchedulerEvent::Error {
        kind: ErrorKind::TaskExecution,
        message: "panicked".into(),
        task: view(1),
    });
    let mut done = view(1);
    done.completed_at_ms = Some(200);
    done.error = Some(TaskError::Execution("panicked".into()));
    log.on_event(&SchedulerEvent::TaskCompleted(done));

    assert_eq!(
        log.names(),
        vec!["task-queued", "task-starting", "error", "task-completed"]
    );
    assert_eq!(log.count("task-completed"), 1);
    assert_eq!(log.errors_of(ErrorKind::TaskExecution).len(), 1);
    assert!(log.errors_of(ErrorKind::TaskAbort).is_empty());
}
