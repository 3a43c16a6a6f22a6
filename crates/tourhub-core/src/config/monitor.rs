//! Monitor, alerting, and retention configuration.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery monitor configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Whether the periodic monitor tick is scheduled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the metrics + alert tick.
    #[serde(default = "default_tick_cron")]
    pub tick_cron: String,
    /// Rolling metrics window in minutes.
    #[serde(default = "default_window")]
    pub window_minutes: i64,
    /// Pending backlog above which health degrades to WARNING.
    #[serde(default = "default_backlog_warning")]
    pub backlog_warning: i64,
    /// Success rate (percent) under which `low_success_rate` fires.
    #[serde(default = "default_success_threshold")]
    pub success_rate_threshold: f64,
    /// Failed count above which `high_failure_count` fires.
    #[serde(default = "default_failed_threshold")]
    pub failed_count_threshold: f64,
    /// Average delivery latency (ms) above which `slow_delivery` fires.
    #[serde(default = "default_slow_delivery")]
    pub slow_delivery_ms: f64,
    /// Minimum seconds between two firings of the same rule.
    #[serde(default = "default_cooldown")]
    pub alert_cooldown_seconds: i64,
    /// Number of fired alerts retained in memory.
    #[serde(default = "default_history_limit")]
    pub alert_history_limit: usize,
    /// Channels alert notifications are sent on.
    #[serde(default = "default_alert_channels")]
    pub alert_channels: Vec<String>,
    /// Operators who receive alert notifications.
    #[serde(default)]
    pub operator_user_ids: Vec<Uuid>,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tick_cron: default_tick_cron(),
            window_minutes: default_window(),
            backlog_warning: default_backlog_warning(),
            success_rate_threshold: default_success_threshold(),
            failed_count_threshold: default_failed_threshold(),
            slow_delivery_ms: default_slow_delivery(),
            alert_cooldown_seconds: default_cooldown(),
            alert_history_limit: default_history_limit(),
            alert_channels: default_alert_channels(),
            operator_user_ids: Vec::new(),
        }
    }
}

/// Retention cleanup configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetentionConfig {
    /// Whether the cleanup job is scheduled.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Cron expression (with seconds) for the cleanup job.
    #[serde(default = "default_cleanup_cron")]
    pub cleanup_cron: String,
    /// Terminally failed records older than this are deleted.
    #[serde(default = "default_failed_after")]
    pub failed_after_days: i64,
    /// Read in-app records older than this are deleted.
    #[serde(default = "default_read_after")]
    pub read_after_days: i64,
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            cleanup_cron: default_cleanup_cron(),
            failed_after_days: default_failed_after(),
            read_after_days: default_read_after(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_tick_cron() -> String {
    "0 * * * * *".to_string()
}

fn default_window() -> i64 {
    60
}

fn default_backlog_warning() -> i64 {
    1000
}

fn default_success_threshold() -> f64 {
    95.0
}

fn default_failed_threshold() -> f64 {
    50.0
}

fn default_slow_delivery() -> f64 {
    60_000.0
}

fn default_cooldown() -> i64 {
    900
}

fn default_history_limit() -> usize {
    200
}

fn default_alert_channels() -> Vec<String> {
    vec!["in_app".to_string(), "email".to_string()]
}

fn default_cleanup_cron() -> String {
    "0 0 3 * * *".to_string()
}

fn default_failed_after() -> i64 {
    30
}

fn default_read_after() -> i64 {
    90
}
