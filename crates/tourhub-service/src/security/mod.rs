//! Pre-persistence checks: content safety, the type/channel permission
//! matrix, and per-user send quotas.

pub mod content;
pub mod permission;
pub mod rate_limit;

use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use tourhub_core::config::security::{RateLimitConfig, SecurityConfig};
use tourhub_core::result::AppResult;
use tourhub_core::traits::cache::CacheProvider;
use tourhub_entity::notification::{NotificationChannel, NotificationType};

pub use content::{ContentChecker, ContentValidation};
pub use rate_limit::{RateLimitResult, RateLimiter};

/// Facade over the three validators, shared by the notification service.
#[derive(Debug, Clone)]
pub struct SecurityValidator {
    content: ContentChecker,
    limiter: RateLimiter,
}

impl SecurityValidator {
    pub fn new(
        security: &SecurityConfig,
        rate_limit: &RateLimitConfig,
        cache: Arc<dyn CacheProvider>,
    ) -> Self {
        Self {
            content: ContentChecker::new(security),
            limiter: RateLimiter::new(rate_limit.clone(), cache),
        }
    }

    /// Run every content check over an optional title and the body.
    pub fn validate_content(&self, title: Option<&str>, content: &str) -> ContentValidation {
        self.content.validate(title, content)
    }

    /// Whether `notification_type` may be sent on `channel`.
    pub fn validate_permission(
        &self,
        user_id: Uuid,
        notification_type: NotificationType,
        channel: NotificationChannel,
    ) -> bool {
        permission::is_allowed(user_id, notification_type, channel)
    }

    /// Consume one unit of the user's quota on `channel`.
    pub async fn validate_rate_limit(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
    ) -> AppResult<RateLimitResult> {
        self.limiter.check(user_id, channel, Utc::now()).await
    }

    /// Return the unit taken by an allowed [`Self::validate_rate_limit`],
    /// for a send that was never persisted.
    pub async fn release_rate_limit(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
        granted: &RateLimitResult,
    ) {
        self.limiter.release(user_id, channel, granted).await
    }

    /// Reject an `actionUrl` in `metadata` that is not an `http`/`https` link.
    pub fn validate_metadata(&self, metadata: Option<&serde_json::Value>) -> Result<(), String> {
        match metadata.and_then(|m| m.get("actionUrl")) {
            None | Some(serde_json::Value::Null) => Ok(()),
            Some(serde_json::Value::String(url)) if content::is_safe_link(url) => Ok(()),
            Some(_) => Err("actionUrl must be an http or https link".to_string()),
        }
    }
}
