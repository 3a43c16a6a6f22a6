//! Mobile push sender fanning out to every registered device.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, warn};
use uuid::Uuid;

use tourhub_database::repositories::RecipientRepository;
use tourhub_entity::notification::NotificationChannel;

use super::transport::{Transport, TransportRequest};
use super::{ChannelSender, DeliveryResult, OutboundMessage};

#[derive(Clone)]
pub struct PushSender {
    transport: Arc<dyn Transport>,
    recipients: Arc<dyn RecipientRepository>,
}

impl std::fmt::Debug for PushSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PushSender")
            .field("transport", &self.transport)
            .finish_non_exhaustive()
    }
}

impl PushSender {
    pub fn new(transport: Arc<dyn Transport>, recipients: Arc<dyn RecipientRepository>) -> Self {
        Self {
            transport,
            recipients,
        }
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Push
    }

    /// Succeeds when at least one device accepts; the first accepted
    /// device's receipt is the external id.
    async fn send(&self, message: &OutboundMessage) -> DeliveryResult {
        let user_id = message
            .destination
            .parse::<Uuid>()
            .unwrap_or(message.user_id);
        let devices = match self.recipients.device_tokens(user_id).await {
            Ok(devices) => devices,
            Err(e) => return DeliveryResult::failed(format!("Device lookup failed: {e}")),
        };
        if devices.is_empty() {
            return DeliveryResult::failed("no registered devices");
        }

        let mut accepted: Option<Option<String>> = None;
        let mut errors = Vec::new();
        for device in &devices {
            let request = TransportRequest {
                channel: NotificationChannel::Push,
                to: device.token.clone(),
                from: None,
                subject: Some(message.title.clone()),
                body: message.content.clone(),
                content_type: "text/plain".to_string(),
                notification_id: message.notification_id,
                metadata: device_payload(&message.metadata, &device.platform),
            };
            match self.transport.deliver(request).await {
                Ok(receipt) => {
                    accepted.get_or_insert(receipt.external_id);
                }
                Err(e) => {
                    debug!(
                        notification_id = %message.notification_id,
                        platform = %device.platform,
                        error = %e,
                        "Push to device failed"
                    );
                    errors.push(format!("{}: {}", mask_token(&device.token), e.message));
                }
            }
        }

        match accepted {
            Some(external_id) => DeliveryResult::delivered(external_id),
            None => {
                warn!(
                    notification_id = %message.notification_id,
                    devices = devices.len(),
                    "Push rejected by every device"
                );
                DeliveryResult::failed(format!("all devices failed: {}", errors.join("; ")))
            }
        }
    }
}

/// The caller's metadata with the device platform added alongside it.
fn device_payload(metadata: &serde_json::Value, platform: &str) -> serde_json::Value {
    let mut payload = match metadata {
        serde_json::Value::Object(map) => map.clone(),
        _ => serde_json::Map::new(),
    };
    payload.insert("platform".into(), platform.into());
    serde_json::Value::Object(payload)
}

fn mask_token(token: &str) -> String {
    let head: String = token.chars().take(8).collect();
    format!("{head}…")
}
