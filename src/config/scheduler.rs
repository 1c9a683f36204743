//! Scheduler configuration structures.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Default number of simultaneously active tasks.
pub const DEFAULT_CONCURRENCY: usize = 1;
/// Default maximum number of pending tasks.
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 10_000;

/// Environment variable holding the concurrency limit.
pub const ENV_CONCURRENCY: &str = "TASKS_CONCURRENCY";
/// Environment variable holding the maximum queue size.
pub const ENV_MAX_QUEUE_SIZE: &str = "TASKS_MAX_QUEUE_SIZE";
/// Environment variable holding the per-task deadline in milliseconds.
pub const ENV_MAX_EXECUTION_TIME_MS: &str = "TASKS_MAX_EXECUTION_TIME_MS";

/// Scheduler configuration.
///
/// Every field falls back to its default when missing from the input, so a
/// partial JSON document is merged over [`SchedulerConfig::default`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum simultaneously active tasks.
    pub concurrency: usize,
    /// Maximum pending (not yet active) tasks before admission fails.
    pub max_queue_size: usize,
    /// Optional per-task execution deadline; `None` disables the watchdog.
    #[serde(with = "crate::util::serde::opt_duration_ms")]
    pub task_max_execution_time: Option<Duration>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            max_queue_size: DEFAULT_MAX_QUEUE_SIZE,
            task_max_execution_time: None,
        }
    }
}

impl SchedulerConfig {
    /// Create a configuration with default values.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    #[must_use]
    pub const fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Set the maximum queue size.
    #[must_use]
    pub const fn with_max_queue_size(mut self, max_queue_size: usize) -> Self {
        self.max_queue_size = max_queue_size;
        self
    }

    /// Set the per-task execution deadline.
    #[must_use]
    pub const fn with_task_max_execution_time(mut self, limit: Duration) -> Self {
        self.task_max_execution_time = Some(limit);
        self
    }

    /// Validate configuration values.
    ///
    /// # Errors
    ///
    /// Returns a description of the first invalid field.
    pub fn validate(&self) -> Result<(), String> {
        if self.concurrency == 0 {
            return Err("concurrency must be greater than 0".into());
        }
        if self.max_queue_size == 0 {
            return Err("max_queue_size must be greater than 0".into());
        }
        if self.task_max_execution_time == Some(Duration::ZERO) {
            return Err("task_max_execution_time must be greater than 0 when set".into());
        }
        Ok(())
    }

    /// Parse configuration from a JSON string, merge over defaults and validate.
    ///
    /// # Errors
    ///
    /// Returns a message if parsing or validation fails.
    pub fn from_json_str(input: &str) -> Result<Self, String> {
        let cfg: Self = serde_json::from_str(input).map_err(|e| format!("parse error: {e}"))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Load configuration from the process environment, reading a `.env`
    /// file first if one exists. Unset variables keep their defaults.
    ///
    /// # Errors
    ///
    /// Returns a message if a variable is not a valid integer or validation fails.
    pub fn from_env() -> Result<Self, String> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// Returns a message if a value is not a valid integer or validation fails.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut cfg = Self::default();
        if let Some(value) = lookup(ENV_CONCURRENCY) {
            cfg.concurrency = parse_var(ENV_CONCURRENCY, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_QUEUE_SIZE) {
            cfg.max_queue_size = parse_var(ENV_MAX_QUEUE_SIZE, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_EXECUTION_TIME_MS) {
            let trimmed = value.trim();
            cfg.task_max_execution_time = if trimmed.is_empty() || trimmed == "null" {
                None
            } else {
                Some(Duration::from_millis(parse_var(ENV_MAX_EXECUTION_TIME_MS, trimmed)?))
            };
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, String> {
    value
        .trim()
        .parse()
        .map_err(|_| format!("{key} must be an unsigned integer, got `{value}`"))
}
