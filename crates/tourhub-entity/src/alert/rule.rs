//! Declarative alert rules evaluated against a metrics snapshot.

use serde::{Deserialize, Serialize};

use crate::metrics::MetricsSnapshot;
use crate::notification::NotificationChannel;

/// A metric an alert condition can read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertMetric {
    SuccessRate,
    FailureRate,
    AverageDeliveryMs,
    PendingCount,
    FailedCount,
    TotalCount,
    RetryingCount,
    Backlog,
}

impl AlertMetric {
    /// Read this metric from a snapshot.
    pub fn read(&self, snapshot: &MetricsSnapshot) -> f64 {
        match self {
            Self::SuccessRate => snapshot.success_rate,
            Self::FailureRate => snapshot.failure_rate,
            Self::AverageDeliveryMs => snapshot.average_delivery_ms,
            Self::PendingCount => snapshot.pending as f64,
            Self::FailedCount => snapshot.failed as f64,
            Self::TotalCount => snapshot.total as f64,
            Self::RetryingCount => snapshot.retrying as f64,
            Self::Backlog => snapshot.backlog as f64,
        }
    }
}

/// Comparison applied between a metric and a threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonOperator {
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
}

impl ComparisonOperator {
    /// Apply the comparison.
    pub fn compare(&self, value: f64, threshold: f64) -> bool {
        match self {
            Self::LessThan => value < threshold,
            Self::LessThanOrEqual => value <= threshold,
            Self::GreaterThan => value > threshold,
            Self::GreaterThanOrEqual => value >= threshold,
        }
    }

    /// Infix symbol for messages.
    pub fn symbol(&self) -> &'static str {
        match self {
            Self::LessThan => "<",
            Self::LessThanOrEqual => "<=",
            Self::GreaterThan => ">",
            Self::GreaterThanOrEqual => ">=",
        }
    }
}

/// `metric operator threshold`, e.g. `success_rate < 95`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlertCondition {
    pub metric: AlertMetric,
    pub operator: ComparisonOperator,
    pub threshold: f64,
}

impl AlertCondition {
    pub fn new(metric: AlertMetric, operator: ComparisonOperator, threshold: f64) -> Self {
        Self {
            metric,
            operator,
            threshold,
        }
    }

    /// Evaluate the condition. Returns the observed value when it holds.
    pub fn evaluate(&self, snapshot: &MetricsSnapshot) -> Option<f64> {
        let value = self.metric.read(snapshot);
        if value.is_nan() {
            return None;
        }
        self.operator.compare(value, self.threshold).then_some(value)
    }
}

/// A named alert condition with its dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertRule {
    /// Unique rule name.
    pub name: String,
    /// Operator-facing description.
    pub description: String,
    /// When the rule fires.
    pub condition: AlertCondition,
    /// Disabled rules are skipped.
    pub enabled: bool,
    /// Channels the alert notification is sent on.
    pub channels: Vec<NotificationChannel>,
    /// Minimum seconds between two firings.
    pub cooldown_seconds: i64,
}

impl AlertRule {
    /// Create an enabled rule.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        condition: AlertCondition,
        channels: Vec<NotificationChannel>,
        cooldown_seconds: i64,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            condition,
            enabled: true,
            channels,
            cooldown_seconds,
        }
    }
}
