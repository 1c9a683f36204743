//! Tests for configuration defaults, validation, and loaders

use std::collections::HashMap;
use std::time::Duration;

use prometheus_task_manager::config::{SchedulerConfig, DEFAULT_CONCURRENCY, DEFAULT_MAX_QUEUE_SIZE};

#[test]
fn test_defaults() {
    let cfg = SchedulerConfig::default();
    assert_eq!(cfg.concurrency, DEFAULT_CONCURRENCY);
    assert_eq!(cfg.concurrency, 1);
    assert_eq!(cfg.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
    assert_eq!(cfg.max_queue_size, 10_000);
    assert_eq!(cfg.task_max_execution_time, None);
    assert!(cfg.validate().is_ok());
}

#[test]
fn test_invalid_concurrency() {
    assert!(SchedulerConfig::new().with_concurrency(0).validate().is_err());
}

#[test]
fn test_invalid_queue_size() {
    assert!(SchedulerConfig::new().with_max_queue_size(0).validate().is_err());
}

#[test]
fn test_invalid_zero_timeout() {
    let cfg = SchedulerConfig::new().with_task_max_execution_time(Duration::ZERO);
    assert!(cfg.validate().is_err());
}

#[test]
fn test_partial_json_merges_over_defaults() {
    let cfg = SchedulerConfig::from_json_str(r#"{ "concurrency": 4 }"#).unwrap();
    assert_eq!(cfg.concurrency, 4);
    assert_eq!(cfg.max_queue_size, DEFAULT_MAX_QUEUE_SIZE);
    assert_eq!(cfg.task_max_execution_time, None);
}

#[test]
fn test_json_deadline_in_milliseconds() {
    let json = r#"{
        "concurrency": 2,
        "max_queue_size": 3,
        "task_max_execution_time": 50
    }"#;
    let cfg = SchedulerConfig::from_json_str(json).unwrap();
    assert_eq!(cfg.task_max_execution_time, Some(Duration::from_millis(50)));

    let null = SchedulerConfig::from_json_str(r#"{ "task_max_execution_time": null }"#).unwrap();
    assert_eq!(null.task_max_execution_time, None);
}

#[test]
fn test_json_serializes_deadline_as_millis() {
    let cfg = SchedulerConfig::new().with_task_max_execution_time(Duration::from_secs(2));
    let value = serde_json::to_value(&cfg).unwrap();
    assert_eq!(value["task_max_execution_time"], 2000);
}

#[test]
fn test_json_rejects_invalid_values() {
    assert!(SchedulerConfig::from_json_str(r#"{ "concurrency": 0 }"#).is_err());
    assert!(SchedulerConfig::from_json_str("not json").is_err());
}

#[test]
fn test_from_lookup() {
    let vars: HashMap<&str, &str> = [
        ("TASKS_CONCURRENCY", "8"),
        ("TASKS_MAX_QUEUE_SIZE", " 64 "),
        ("TASKS_MAX_EXECUTION_TIME_MS", "1500"),
    ]
    .into_iter()
    .collect();
    let cfg = SchedulerConfig::from_lookup(|key| vars.get(key).map(ToString::to_string)).unwrap();
    assert_eq!(cfg.concurrency, 8);
    assert_eq!(cfg.max_queue_size, 64);
    assert_eq!(cfg.task_max_execution_time, Some(Duration::from_millis(1500)));
}

#[test]
fn test_from_lookup_defaults_and_errors() {
    let cfg = SchedulerConfig::from_lookup(|_| None).unwrap();
    assert_eq!(cfg, SchedulerConfig::default());

    let disabled = SchedulerConfig::from_lookup(|key| {
        (key == "TASKS_MAX_EXECUTION_TIME_MS").then(|| "null".to_string())
    })
    .unwrap();
    assert_eq!(disabled.task_max_execution_time, None);

    let err = SchedulerConfig::from_lookup(|key| {
        (key == "TASKS_CONCURRENCY").then(|| "many".to_string())
    })
    .unwrap_err();
    assert!(err.contains("TASKS_CONCURRENCY"));
}
