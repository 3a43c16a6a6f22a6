//! Fired alert events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How badly delivery has degraded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AlertSeverity {
    /// Map a success rate (percent) onto a severity.
    pub fn from_success_rate(success_rate: f64) -> Self {
        if success_rate < 50.0 {
            Self::Critical
        } else if success_rate < 70.0 {
            Self::High
        } else if success_rate < 90.0 {
            Self::Medium
        } else {
            Self::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// One firing of an alert rule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: Uuid,
    pub rule_name: String,
    pub severity: AlertSeverity,
    pub message: String,
    /// Metric value that tripped the rule.
    pub metric_value: f64,
    pub threshold: f64,
    pub fired_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl AlertEvent {
    /// Mark the alert resolved at `at`. Resolving twice keeps the first time.
    pub fn resolve(&mut self, at: DateTime<Utc>) {
        if !self.resolved {
            self.resolved = true;
            self.resolved_at = Some(at);
        }
    }
}
