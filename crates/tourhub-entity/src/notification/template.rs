//! Message template entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::kind::{NotificationChannel, NotificationType};

/// A reusable title/content pair with `{{variable}}` placeholders.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationTemplate {
    /// Unique template identifier.
    pub id: Uuid,
    /// Human-readable template name.
    pub name: String,
    /// Category this template is written for.
    pub notification_type: NotificationType,
    /// Channel restriction. `None` means usable on every channel.
    pub channel: Option<NotificationChannel>,
    /// Title with placeholders.
    pub title_template: String,
    /// Body with placeholders.
    pub content_template: String,
    /// Disabled templates resolve as missing.
    pub enabled: bool,
    /// When the template was created.
    pub created_at: DateTime<Utc>,
    /// When the template was last modified.
    pub updated_at: DateTime<Utc>,
}

impl NotificationTemplate {
    /// Check if this template can render a message for `channel`.
    pub fn usable_on(&self, channel: NotificationChannel) -> bool {
        self.enabled && self.channel.is_none_or(|c| c == channel)
    }
}
