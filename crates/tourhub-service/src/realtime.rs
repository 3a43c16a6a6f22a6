//! Per-user broadcast of in-app notifications to online sessions.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio::sync::broadcast;
use uuid::Uuid;

use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;

/// Payload pushed to a user's live sessions when an in-app message lands.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeEvent {
    pub notification_id: Uuid,
    pub user_id: Uuid,
    pub title: String,
    pub content: String,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

/// In-memory pub/sub keyed by user.
///
/// Channels are created lazily on first subscribe; publishing to a user with
/// no live subscriber is a no-op.
#[derive(Debug)]
pub struct RealtimeHub {
    /// User id → broadcast sender
    channels: RwLock<HashMap<Uuid, broadcast::Sender<RealtimeEvent>>>,
    buffer_size: usize,
}

impl RealtimeHub {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            channels: RwLock::new(HashMap::new()),
            buffer_size: buffer_size.max(1),
        }
    }

    /// Publish to every live session of `event.user_id`.
    ///
    /// Returns how many receivers got the event.
    pub async fn publish(&self, event: RealtimeEvent) -> AppResult<usize> {
        let channels = self.channels.read().await;
        let Some(tx) = channels.get(&event.user_id) else {
            return Ok(0);
        };
        if tx.receiver_count() == 0 {
            return Ok(0);
        }
        tx.send(event)
            .map_err(|e| AppError::internal(format!("Realtime publish failed: {e}")))
    }

    /// Subscribe to a user's events.
    pub async fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<RealtimeEvent> {
        let mut channels = self.channels.write().await;
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(self.buffer_size).0)
            .subscribe()
    }

    /// Drop channels with no remaining subscribers.
    pub async fn prune(&self) -> usize {
        let mut channels = self.channels.write().await;
        let before = channels.len();
        channels.retain(|_, tx| tx.receiver_count() > 0);
        before - channels.len()
    }

    /// Check if the user has at least one live subscriber.
    pub async fn is_online(&self, user_id: Uuid) -> bool {
        self.channels
            .read()
            .await
            .get(&user_id)
            .is_some_and(|tx| tx.receiver_count() > 0)
    }
}

impl Default for RealtimeHub {
    fn default() -> Self {
        Self::new(64)
    }
}
