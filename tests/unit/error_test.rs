//! Tests for error types

use std::time::Duration;

use prometheus_task_manager::core::{ErrorKind, SchedulerError, TaskError};

#[test]
fn test_queue_full_error() {
    let err = SchedulerError::QueueFull { max_queue_size: 3 };
    assert_eq!(format!("{}", err), "queue full: max queue size 3 reached");
    assert_eq!(err.kind(), Some(ErrorKind::QueueFull));
}

#[test]
fn test_invalid_config_error() {
    let err = SchedulerError::InvalidConfig("concurrency must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: concurrency must be greater than 0"
    );
    assert_eq!(err.kind(), None);
}

#[test]
fn test_timeout_error() {
    let err = TaskError::Timeout {
        limit: Duration::from_millis(50),
    };
    assert_eq!(format!("{}", err), "task execution timeout after 50ms");
    assert_eq!(err.kind(), Some(ErrorKind::TaskTimeout));
    assert!(err.is_timeout());
}

#[test]
fn test_failed_error_keeps_source_message() {
    let err = TaskError::from(anyhow::anyhow!("upstream refused"));
    assert_eq!(format!("{}", err), "upstream refused");
    assert_eq!(err.kind(), None);
    assert!(!err.is_timeout());
}

#[test]
fn test_execution_and_cancelled_errors() {
    let err = TaskError::Execution("index out of bounds".to_string());
    assert_eq!(format!("{}", err), "task execution fault: index out of bounds");
    assert_eq!(err.kind(), Some(ErrorKind::TaskExecution));

    assert_eq!(
        format!("{}", TaskError::Cancelled),
        "task cancelled before completion"
    );
}

#[test]
fn test_error_kind_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorKind::InternalInvariant).unwrap();
    assert_eq!(json, "\"internal_invariant\"");
}
