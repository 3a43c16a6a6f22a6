//! Input to [`NotificationService::create_and_send`](super::NotificationService::create_and_send).

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tourhub_entity::notification::{NotificationChannel, NotificationPriority, NotificationType};

/// A request to notify one user on one channel.
///
/// Either `title` and `content` or a `template_id` must be given. When both
/// are present the template wins and the raw text is the fallback.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotificationRequest {
    pub user_id: Uuid,
    #[serde(default)]
    pub order_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub channel: NotificationChannel,
    #[serde(default)]
    pub priority: Option<NotificationPriority>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub template_id: Option<Uuid>,
    /// Template variables; override values derived from the user and order.
    #[serde(default)]
    pub variables: HashMap<String, String>,
    /// Carried to the sender. String and number entries also feed the template.
    #[serde(default)]
    pub metadata: Option<serde_json::Value>,
    /// Earliest send time; defaults to now.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub max_retries: Option<i32>,
}

impl CreateNotificationRequest {
    /// Creates a request with literal title and content.
    pub fn new(
        user_id: Uuid,
        notification_type: NotificationType,
        channel: NotificationChannel,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            user_id,
            order_id: None,
            notification_type,
            channel,
            priority: None,
            title: Some(title.into()),
            content: Some(content.into()),
            template_id: None,
            variables: HashMap::new(),
            metadata: None,
            scheduled_at: None,
            max_retries: None,
        }
    }

    /// Creates a request rendered from a stored template.
    pub fn from_template(
        user_id: Uuid,
        notification_type: NotificationType,
        channel: NotificationChannel,
        template_id: Uuid,
        variables: HashMap<String, String>,
    ) -> Self {
        Self {
            title: None,
            content: None,
            template_id: Some(template_id),
            variables,
            ..Self::new(user_id, notification_type, channel, "", "")
        }
    }

    pub fn with_order(mut self, order_id: Uuid) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_priority(mut self, priority: NotificationPriority) -> Self {
        self.priority = Some(priority);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn schedule_at(mut self, at: DateTime<Utc>) -> Self {
        self.scheduled_at = Some(at);
        self
    }

    pub fn with_max_retries(mut self, max_retries: i32) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Same request on another channel.
    pub fn on_channel(&self, channel: NotificationChannel) -> Self {
        Self {
            channel,
            ..self.clone()
        }
    }

    pub fn priority(&self) -> NotificationPriority {
        self.priority.unwrap_or_default()
    }
}
