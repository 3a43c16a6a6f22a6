//! Channel senders: one implementation per [`NotificationChannel`], all
//! behind the [`ChannelSender`] contract.

pub mod email;
pub mod in_app;
pub mod push;
pub mod registry;
pub mod sms;
pub mod transport;

#[cfg(test)]
pub(crate) mod mock;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use tourhub_entity::notification::{Notification, NotificationChannel};

pub use email::EmailSender;
pub use in_app::InAppSender;
pub use push::PushSender;
pub use registry::ChannelRegistry;
pub use sms::SmsSender;
pub use transport::{HttpTransport, LogTransport, Transport, TransportReceipt, TransportRequest};

/// A rendered message addressed to one destination.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    /// Phone number, email address, or user id depending on the channel.
    pub destination: String,
    pub title: String,
    pub content: String,
    pub metadata: serde_json::Value,
}

impl OutboundMessage {
    pub fn for_notification(notification: &Notification, destination: impl Into<String>) -> Self {
        Self {
            notification_id: notification.id,
            user_id: notification.user_id,
            destination: destination.into(),
            title: notification.title.clone(),
            content: notification.content.clone(),
            metadata: notification.metadata.clone(),
        }
    }

    pub fn metadata_str(&self, key: &str) -> Option<&str> {
        self.metadata.get(key).and_then(|v| v.as_str())
    }
}

/// Result of one send attempt. Expected failures are values, never `Err`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryResult {
    pub success: bool,
    pub external_id: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub error_message: Option<String>,
}

impl DeliveryResult {
    pub fn delivered(external_id: Option<String>) -> Self {
        Self {
            success: true,
            external_id,
            delivered_at: Some(Utc::now()),
            error_message: None,
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            external_id: None,
            delivered_at: None,
            error_message: Some(message.into()),
        }
    }
}

/// Uniform send capability shared by every channel.
#[async_trait]
pub trait ChannelSender: Send + Sync + std::fmt::Debug {
    fn channel(&self) -> NotificationChannel;

    async fn send(&self, message: &OutboundMessage) -> DeliveryResult;
}
