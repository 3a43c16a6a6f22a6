//! Channel lookup and destination resolution.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::warn;

use tourhub_core::config::channels::ChannelsConfig;
use tourhub_core::result::AppResult;
use tourhub_database::repositories::RecipientRepository;
use tourhub_entity::notification::{Notification, NotificationChannel};

use super::transport::{self, Transport};
use super::{
    ChannelSender, DeliveryResult, EmailSender, InAppSender, OutboundMessage, PushSender,
    SmsSender,
};
use crate::realtime::RealtimeHub;

/// Maps each channel to its sender and knows where each channel delivers.
#[derive(Clone)]
pub struct ChannelRegistry {
    senders: HashMap<NotificationChannel, Arc<dyn ChannelSender>>,
    recipients: Arc<dyn RecipientRepository>,
}

impl std::fmt::Debug for ChannelRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChannelRegistry")
            .field("channels", &self.senders.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}

impl ChannelRegistry {
    /// An empty registry; add senders with [`Self::register`].
    pub fn new(recipients: Arc<dyn RecipientRepository>) -> Self {
        Self {
            senders: HashMap::new(),
            recipients,
        }
    }

    /// Build all four senders from configuration.
    pub fn from_config(
        config: &ChannelsConfig,
        recipients: Arc<dyn RecipientRepository>,
        hub: Arc<RealtimeHub>,
    ) -> AppResult<Self> {
        let sms = transport::from_gateway(NotificationChannel::Sms, &config.sms)?;
        let email = transport::from_gateway(NotificationChannel::Email, &config.email)?;
        let push = transport::from_gateway(NotificationChannel::Push, &config.push)?;
        Ok(Self::with_transports(config, recipients, hub, sms, email, push))
    }

    /// Build all four senders over explicit transports.
    pub fn with_transports(
        config: &ChannelsConfig,
        recipients: Arc<dyn RecipientRepository>,
        hub: Arc<RealtimeHub>,
        sms: Arc<dyn Transport>,
        email: Arc<dyn Transport>,
        push: Arc<dyn Transport>,
    ) -> Self {
        Self::new(recipients.clone())
            .register(Arc::new(SmsSender::new(sms, config.sms_signature.clone())))
            .register(Arc::new(EmailSender::new(email, config.email_from.clone())))
            .register(Arc::new(PushSender::new(push, recipients)))
            .register(Arc::new(InAppSender::new(hub)))
    }

    /// Add or replace the sender for its channel.
    pub fn register(mut self, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(sender.channel(), sender);
        self
    }

    pub fn sender(&self, channel: NotificationChannel) -> Option<Arc<dyn ChannelSender>> {
        self.senders.get(&channel).cloned()
    }

    /// Where `notification` should go, or `None` when the recipient has no
    /// usable contact for its channel.
    pub async fn resolve_destination(&self, notification: &Notification) -> AppResult<Option<String>> {
        match notification.channel {
            NotificationChannel::InApp | NotificationChannel::Push => {
                Ok(Some(notification.user_id.to_string()))
            }
            NotificationChannel::Sms => Ok(self
                .recipients
                .find_contact(notification.user_id)
                .await?
                .and_then(|c| c.phone)
                .filter(|p| !p.trim().is_empty())),
            NotificationChannel::Email => Ok(self
                .recipients
                .find_contact(notification.user_id)
                .await?
                .and_then(|c| c.email)
                .filter(|e| !e.trim().is_empty())),
        }
    }

    /// Resolve the destination and send. Never returns an error.
    pub async fn dispatch(&self, notification: &Notification) -> DeliveryResult {
        let Some(sender) = self.sender(notification.channel) else {
            return DeliveryResult::failed(format!(
                "No sender registered for channel {}",
                notification.channel
            ));
        };

        let destination = match self.resolve_destination(notification).await {
            Ok(Some(destination)) => destination,
            Ok(None) => {
                return DeliveryResult::failed(format!(
                    "No {} contact on file for user {}",
                    notification.channel, notification.user_id
                ));
            }
            Err(e) => {
                warn!(notification_id = %notification.id, error = %e, "Destination lookup failed");
                return DeliveryResult::failed(format!("Destination lookup failed: {}", e.message));
            }
        };

        sender
            .send(&OutboundMessage::for_notification(notification, destination))
            .await
    }
}
