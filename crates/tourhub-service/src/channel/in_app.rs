//! In-app sender. The persisted record is the message; this only nudges
//! live sessions.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tracing::{debug, warn};

use tourhub_entity::notification::NotificationChannel;

use super::{ChannelSender, DeliveryResult, OutboundMessage};
use crate::realtime::{RealtimeEvent, RealtimeHub};

#[derive(Debug, Clone)]
pub struct InAppSender {
    hub: Arc<RealtimeHub>,
}

impl InAppSender {
    pub fn new(hub: Arc<RealtimeHub>) -> Self {
        Self { hub }
    }
}

#[async_trait]
impl ChannelSender for InAppSender {
    fn channel(&self) -> NotificationChannel {
        NotificationChannel::InApp
    }

    async fn send(&self, message: &OutboundMessage) -> DeliveryResult {
        let event = RealtimeEvent {
            notification_id: message.notification_id,
            user_id: message.user_id,
            title: message.title.clone(),
            content: message.content.clone(),
            metadata: message.metadata.clone(),
            created_at: Utc::now(),
        };
        match self.hub.publish(event).await {
            Ok(receivers) => debug!(
                notification_id = %message.notification_id,
                receivers,
                "In-app notification published"
            ),
            Err(e) => warn!(
                notification_id = %message.notification_id,
                error = %e,
                "Realtime publish failed; message stays in the notification center"
            ),
        }
        DeliveryResult::delivered(Some(message.notification_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_always_succeeds_and_pushes_to_live_session() {
        let hub = Arc::new(RealtimeHub::default());
        let sender = InAppSender::new(hub.clone());
        let user = Uuid::new_v4();
        let id = Uuid::new_v4();
        let msg = OutboundMessage {
            notification_id: id,
            user_id: user,
            destination: user.to_string(),
            title: "Reminder".into(),
            content: "Tour departs at 08:00".into(),
            metadata: serde_json::json!({}),
        };

        let offline = sender.send(&msg).await;
        assert!(offline.success);
        assert_eq!(offline.external_id, Some(id.to_string()));

        let mut rx = hub.subscribe(user).await;
        assert!(sender.send(&msg).await.success);
        assert_eq!(rx.recv().await.unwrap().notification_id, id);
    }
}
