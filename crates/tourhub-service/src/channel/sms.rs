//! SMS sender for mainland China mobile numbers.

use std::sync::{Arc, LazyLock};

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, warn};

use tourhub_entity::notification::NotificationChannel;

use super::transport::{Transport, TransportRequest};
use super::{ChannelSender, DeliveryResult, OutboundMessage};

static MAINLAND_MOBILE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\+?86)?1[3-9]\d{9}$").expect("mobile pattern is valid"));

/// Strip the separators people type into phone numbers.
pub fn normalize_phone(raw: &str) -> String {
    raw.chars().filter(|c| !matches!(c, ' ' | '-')).collect()
}

pub fn is_valid_mobile(raw: &str) -> bool {
    MAINLAND_MOBILE.is_match(&normalize_phone(raw))
}

#[derive(Debug, Clone)]
pub struct SmsSender {
    transport: Arc<dyn Transport>,
    signature: String,
}

impl SmsSender {
    pub fn new(transport: Arc<dyn Transport>, signature: impl Into<String>) -> Self {
        Self {
            transport,
            signature: signature.into(),
        }
    }

    fn sign(&self, content: &str) -> String {
        if self.signature.is_empty() || content.starts_with(&self.signature) {
            content.to_string()
        } else {
            format!("{}{content}", self.signature)
        }
    }
}

#[async_trait]
impl ChannelSender for SmsSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Sms
    }

    async fn send(&self, message: &OutboundMessage) -> DeliveryResult {
        let phone = normalize_phone(&message.destination);
        if !MAINLAND_MOBILE.is_match(&phone) {
            debug!(notification_id = %message.notification_id, "Rejected invalid mobile number");
            return DeliveryResult::failed(format!(
                "Invalid mobile number: {}",
                message.destination
            ));
        }

        let request = TransportRequest {
            channel: NotificationChannel::Sms,
            to: phone,
            from: None,
            subject: None,
            body: self.sign(&message.content),
            content_type: "text/plain".to_string(),
            notification_id: message.notification_id,
            metadata: message.metadata.clone(),
        };

        match self.transport.deliver(request).await {
            Ok(receipt) => DeliveryResult::delivered(receipt.external_id),
            Err(e) => {
                warn!(notification_id = %message.notification_id, error = %e, "SMS send failed");
                DeliveryResult::failed(e.message)
            }
        }
    }
}
