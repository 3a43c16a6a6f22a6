//! Notification queue and retry configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Polling scheduler configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    /// Whether the queue runner is started.
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Interval in seconds between queue polls.
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    /// Maximum due records claimed per tick.
    #[serde(default = "default_batch_size")]
    pub batch_size: i64,
    /// Records per dispatch chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Global ceiling of in-flight channel sends.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
    /// Per-send timeout in seconds.
    #[serde(default = "default_send_timeout")]
    pub send_timeout_seconds: u64,
    /// How long a claim stays valid before the record is considered abandoned.
    #[serde(default = "default_lease")]
    pub lease_seconds: u64,
    /// Records due for longer than this sort one priority level higher.
    /// `0` disables aging.
    #[serde(default)]
    pub aging_after_seconds: u64,
    /// Seconds to wait for in-flight sends on shutdown.
    #[serde(default = "default_drain_timeout")]
    pub drain_timeout_seconds: u64,
}

impl QueueConfig {
    /// Poll interval as a [`Duration`].
    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds.max(1))
    }

    /// Send timeout as a [`Duration`].
    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds.max(1))
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            poll_interval_seconds: default_poll_interval(),
            batch_size: default_batch_size(),
            chunk_size: default_chunk_size(),
            concurrency: default_concurrency(),
            send_timeout_seconds: default_send_timeout(),
            lease_seconds: default_lease(),
            aging_after_seconds: 0,
            drain_timeout_seconds: default_drain_timeout(),
        }
    }
}

/// Exponential backoff policy applied on failed sends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Delay before the first retry, in seconds.
    #[serde(default = "default_base_delay")]
    pub base_delay_seconds: u64,
    /// Growth factor applied per attempt.
    #[serde(default = "default_multiplier")]
    pub backoff_multiplier: f64,
    /// Upper bound on any single delay, in seconds.
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: u64,
    /// Default `max_retries` for new notifications.
    #[serde(default = "default_max_retries")]
    pub max_retries: i32,
    /// Uniform jitter as a fraction of the delay (0.1 = ±10%).
    #[serde(default = "default_jitter")]
    pub jitter_ratio: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            base_delay_seconds: default_base_delay(),
            backoff_multiplier: default_multiplier(),
            max_delay_seconds: default_max_delay(),
            max_retries: default_max_retries(),
            jitter_ratio: default_jitter(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_poll_interval() -> u64 {
    5
}

fn default_batch_size() -> i64 {
    100
}

fn default_chunk_size() -> usize {
    10
}

fn default_concurrency() -> usize {
    10
}

fn default_send_timeout() -> u64 {
    30
}

fn default_lease() -> u64 {
    300
}

fn default_drain_timeout() -> u64 {
    30
}

fn default_base_delay() -> u64 {
    30
}

fn default_multiplier() -> f64 {
    2.0
}

fn default_max_delay() -> u64 {
    3600
}

fn default_max_retries() -> i32 {
    3
}

fn default_jitter() -> f64 {
    0.1
}
