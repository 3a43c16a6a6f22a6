//! Delivery metrics derived from persisted notification state.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::notification::{NotificationChannel, NotificationStatus, NotificationType};

/// One `GROUP BY channel, type, status` row over the metrics window.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct StatusBreakdownRow {
    pub channel: NotificationChannel,
    pub notification_type: NotificationType,
    pub status: NotificationStatus,
    pub count: i64,
    /// Rows in this group with `retry_count > 0`.
    pub retrying: i64,
}

/// Frequency of one error message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ErrorCount {
    pub message: String,
    pub count: i64,
}

/// Current record counts per status across the whole table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    pub pending: i64,
    pub sent: i64,
    pub delivered: i64,
    pub failed: i64,
}

impl StatusCounts {
    /// Add `count` records of `status`.
    pub fn add(&mut self, status: NotificationStatus, count: i64) {
        match status {
            NotificationStatus::Pending => self.pending += count,
            NotificationStatus::Sent => self.sent += count,
            NotificationStatus::Delivered => self.delivered += count,
            NotificationStatus::Failed => self.failed += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.pending + self.sent + self.delivered + self.failed
    }
}

/// Per-channel slice of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChannelMetrics {
    pub channel: NotificationChannel,
    pub total: i64,
    pub delivered: i64,
    pub failed: i64,
    pub success_rate: f64,
}

/// Count of records of one type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TypeCount {
    pub notification_type: NotificationType,
    pub count: i64,
}

/// Aggregate delivery state over a rolling window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub collected_at: DateTime<Utc>,
    pub window_minutes: i64,
    pub total: i64,
    pub pending: i64,
    pub sent: i64,
    pub delivered: i64,
    pub failed: i64,
    /// Pending records waiting on a backoff delay.
    pub retrying: i64,
    /// Every `PENDING` record, regardless of the window.
    pub backlog: i64,
    /// `delivered / (delivered + failed)` as a percentage; 100 with no outcomes.
    pub success_rate: f64,
    /// `failed / (delivered + failed)` as a percentage; 0 with no outcomes.
    pub failure_rate: f64,
    /// Mean `delivered_at - created_at` in milliseconds.
    pub average_delivery_ms: f64,
    pub by_channel: Vec<ChannelMetrics>,
    pub by_type: Vec<TypeCount>,
    pub top_errors: Vec<ErrorCount>,
}

impl MetricsSnapshot {
    /// A snapshot with no records.
    pub fn empty(collected_at: DateTime<Utc>, window_minutes: i64) -> Self {
        Self {
            collected_at,
            window_minutes,
            total: 0,
            pending: 0,
            sent: 0,
            delivered: 0,
            failed: 0,
            retrying: 0,
            backlog: 0,
            success_rate: 100.0,
            failure_rate: 0.0,
            average_delivery_ms: 0.0,
            by_channel: Vec::new(),
            by_type: Vec::new(),
            top_errors: Vec::new(),
        }
    }

    /// Fold grouped rows into a snapshot.
    pub fn from_breakdown(
        collected_at: DateTime<Utc>,
        window_minutes: i64,
        rows: &[StatusBreakdownRow],
        average_delivery_ms: Option<f64>,
        top_errors: Vec<ErrorCount>,
    ) -> Self {
        let mut snapshot = Self::empty(collected_at, window_minutes);
        let mut channels: BTreeMap<&'static str, (NotificationChannel, StatusCounts)> =
            BTreeMap::new();
        let mut types: BTreeMap<&'static str, (NotificationType, i64)> = BTreeMap::new();
        let mut totals = StatusCounts::default();

        for row in rows {
            totals.add(row.status, row.count);
            if row.status == NotificationStatus::Pending {
                snapshot.retrying += row.retrying;
            }
            channels
                .entry(row.channel.as_str())
                .or_insert((row.channel, StatusCounts::default()))
                .1
                .add(row.status, row.count);
            types
                .entry(row.notification_type.as_str())
                .or_insert((row.notification_type, 0))
                .1 += row.count;
        }

        snapshot.pending = totals.pending;
        snapshot.sent = totals.sent;
        snapshot.delivered = totals.delivered;
        snapshot.failed = totals.failed;
        snapshot.total = totals.total();
        snapshot.average_delivery_ms = average_delivery_ms.unwrap_or(0.0);
        snapshot.by_channel = channels
            .into_values()
            .map(|(channel, counts)| ChannelMetrics {
                channel,
                total: counts.total(),
                delivered: counts.delivered,
                failed: counts.failed,
                success_rate: success_rate(counts.delivered, counts.failed),
            })
            .collect();
        snapshot.by_type = types
            .into_values()
            .map(|(notification_type, count)| TypeCount {
                notification_type,
                count,
            })
            .collect();
        snapshot.top_errors = top_errors;
        snapshot.recompute_rates();
        snapshot
    }

    /// Recompute `success_rate` and `failure_rate` from the counts.
    pub fn recompute_rates(&mut self) {
        self.success_rate = success_rate(self.delivered, self.failed);
        self.failure_rate = if self.delivered + self.failed == 0 {
            0.0
        } else {
            100.0 - self.success_rate
        };
    }
}

fn success_rate(delivered: i64, failed: i64) -> f64 {
    let outcomes = delivered + failed;
    if outcomes == 0 {
        100.0
    } else {
        delivered as f64 / outcomes as f64 * 100.0
    }
}

/// Overall engine health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HealthStatus {
    Healthy,
    Warning,
    Critical,
}
