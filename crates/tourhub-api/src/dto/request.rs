//! Request DTOs with validation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use tourhub_entity::notification::{
    DeliveryFrequency, NotificationChannel, NotificationPriority, NotificationType,
    NotificationUserConfig,
};
use tourhub_service::CreateNotificationRequest;

/// `POST /api/notifications` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateNotificationBody {
    pub user_id: Uuid,
    pub order_id: Option<Uuid>,
    pub notification_type: NotificationType,
    pub channel: NotificationChannel,
    pub priority: Option<NotificationPriority>,
    /// Literal title. Required with `content` unless `template_id` is set.
    #[validate(length(min = 1, message = "Title must not be empty"))]
    pub title: Option<String>,
    #[validate(length(min = 1, message = "Content must not be empty"))]
    pub content: Option<String>,
    pub template_id: Option<Uuid>,
    #[serde(default)]
    pub variables: HashMap<String, String>,
    pub metadata: Option<serde_json::Value>,
    pub scheduled_at: Option<DateTime<Utc>>,
    #[validate(range(min = 0, max = 10, message = "max_retries must be between 0 and 10"))]
    pub max_retries: Option<i32>,
}

impl CreateNotificationBody {
    /// Converts into the service request.
    pub fn into_request(self) -> CreateNotificationRequest {
        CreateNotificationRequest {
            user_id: self.user_id,
            order_id: self.order_id,
            notification_type: self.notification_type,
            channel: self.channel,
            priority: self.priority,
            title: self.title,
            content: self.content,
            template_id: self.template_id,
            variables: self.variables,
            metadata: self.metadata,
            scheduled_at: self.scheduled_at,
            max_retries: self.max_retries,
        }
    }
}

/// Query string of the inbox listing.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InboxQuery {
    #[serde(default)]
    pub unread_only: bool,
}

/// `PUT /api/users/{user_id}/notification-settings/{channel}` body.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateUserConfigBody {
    pub enabled: bool,
    #[validate(range(min = 0, max = 23, message = "Quiet hours use 0-23"))]
    pub quiet_hours_start: Option<i16>,
    #[validate(range(min = 0, max = 23, message = "Quiet hours use 0-23"))]
    pub quiet_hours_end: Option<i16>,
    #[serde(default)]
    pub frequency: DeliveryFrequency,
    #[serde(default)]
    pub muted_types: Vec<NotificationType>,
}

impl UpdateUserConfigBody {
    pub fn into_config(self, user_id: Uuid, channel: NotificationChannel) -> NotificationUserConfig {
        let mut config = NotificationUserConfig::default_for(user_id, channel);
        config.enabled = self.enabled;
        config.quiet_hours_start = self.quiet_hours_start;
        config.quiet_hours_end = self.quiet_hours_end;
        config.frequency = self.frequency;
        config.set_muted_types(self.muted_types);
        config
    }
}

/// Business event posted by the order and payment systems.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum OrderEvent {
    OrderConfirmed,
    PaymentSucceeded { amount: f64 },
    PaymentFailed { reason: String },
    BookingReminder { remind_at: Option<DateTime<Utc>> },
    OrderCancelled { reason: Option<String> },
    RefundProcessed { amount: f64 },
}

/// Query of `GET /api/monitor/alerts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertQuery {
    /// Include the resolved history instead of only active alerts.
    #[serde(default)]
    pub history: bool,
    #[serde(default = "default_alert_limit")]
    pub limit: usize,
}

fn default_alert_limit() -> usize {
    50
}
