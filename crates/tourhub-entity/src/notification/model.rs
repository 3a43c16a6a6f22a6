//! Notification entity model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{NotificationChannel, NotificationPriority, NotificationStatus, NotificationType};

/// A message addressed to one user on one channel.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Notification {
    /// Unique notification identifier.
    pub id: Uuid,
    /// The recipient user.
    pub user_id: Uuid,
    /// Correlated business order, if any.
    pub order_id: Option<Uuid>,
    /// Business category.
    pub notification_type: NotificationType,
    /// Delivery transport. Never changes after creation.
    pub channel: NotificationChannel,
    /// Dispatch priority.
    pub priority: NotificationPriority,
    /// Current delivery state.
    pub status: NotificationStatus,
    /// Rendered title.
    pub title: String,
    /// Rendered body.
    pub content: String,
    /// Template that produced title and content.
    pub template_id: Option<Uuid>,
    /// Free-form data passed to the channel sender (`actionUrl`, amounts, ...).
    pub metadata: serde_json::Value,
    /// Earliest eligible send time.
    pub scheduled_at: DateTime<Utc>,
    /// Failed attempts so far.
    pub retry_count: i32,
    /// Failed attempts allowed before the record is terminally failed.
    pub max_retries: i32,
    /// First claim time.
    pub sent_at: Option<DateTime<Utc>>,
    /// Time the channel accepted the message.
    pub delivered_at: Option<DateTime<Utc>>,
    /// Time of the most recent retry scheduling.
    pub last_retry_at: Option<DateTime<Utc>>,
    /// Last failure reason.
    pub error_message: Option<String>,
    /// Identifier returned by the channel transport.
    pub external_id: Option<String>,
    /// When the user acknowledged an in-app message.
    pub read_at: Option<DateTime<Utc>>,
    /// Worker currently holding the dispatch claim.
    pub claimed_by: Option<String>,
    /// When the dispatch claim lapses.
    pub claim_expires_at: Option<DateTime<Utc>>,
    /// When the notification was created.
    pub created_at: DateTime<Utc>,
    /// When the notification was last modified.
    pub updated_at: DateTime<Utc>,
}

impl Notification {
    /// Check if the record is `PENDING` and its `scheduled_at` has passed.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.status == NotificationStatus::Pending && self.scheduled_at <= now
    }

    /// Check if another failed attempt would still be retried.
    pub fn has_retries_left(&self) -> bool {
        self.retry_count < self.max_retries
    }

    /// Check if an in-app message has not been acknowledged.
    pub fn is_unread(&self) -> bool {
        self.channel == NotificationChannel::InApp && self.read_at.is_none()
    }

    /// Read a string value out of `metadata`.
    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Insert payload for a new notification. Always persisted as `PENDING`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewNotification {
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub channel: NotificationChannel,
    pub priority: NotificationPriority,
    pub title: String,
    pub content: String,
    pub template_id: Option<Uuid>,
    pub metadata: serde_json::Value,
    pub scheduled_at: DateTime<Utc>,
    pub max_retries: i32,
}

impl NewNotification {
    /// Materialize the row a store would persist for this payload.
    pub fn into_record(self, id: Uuid, now: DateTime<Utc>) -> Notification {
        Notification {
            id,
            user_id: self.user_id,
            order_id: self.order_id,
            notification_type: self.notification_type,
            channel: self.channel,
            priority: self.priority,
            status: NotificationStatus::Pending,
            title: self.title,
            content: self.content,
            template_id: self.template_id,
            metadata: self.metadata,
            scheduled_at: self.scheduled_at,
            retry_count: 0,
            max_retries: self.max_retries.max(0),
            sent_at: None,
            delivered_at: None,
            last_retry_at: None,
            error_message: None,
            external_id: None,
            read_at: None,
            claimed_by: None,
            claim_expires_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}
