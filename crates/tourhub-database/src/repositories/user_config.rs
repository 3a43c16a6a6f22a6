//! Per-user channel preference repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_entity::notification::{NotificationChannel, NotificationUserConfig};

/// Storage contract for [`NotificationUserConfig`] rows.
#[async_trait]
pub trait UserConfigRepository: Send + Sync {
    /// The stored row for `(user_id, channel)`, if any.
    async fn find(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
    ) -> AppResult<Option<NotificationUserConfig>>;

    /// Every stored row for a user.
    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<NotificationUserConfig>>;

    /// Insert or replace a row.
    async fn upsert(&self, config: &NotificationUserConfig) -> AppResult<NotificationUserConfig>;
}

/// PostgreSQL implementation of [`UserConfigRepository`].
#[derive(Debug, Clone)]
pub struct PgUserConfigRepository {
    pool: PgPool,
}

impl PgUserConfigRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserConfigRepository for PgUserConfigRepository {
    async fn find(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
    ) -> AppResult<Option<NotificationUserConfig>> {
        sqlx::query_as::<_, NotificationUserConfig>(
            "SELECT * FROM notification_user_configs WHERE user_id = $1 AND channel = $2",
        )
        .bind(user_id)
        .bind(channel)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load user config", e))
    }

    async fn list_for_user(&self, user_id: Uuid) -> AppResult<Vec<NotificationUserConfig>> {
        sqlx::query_as::<_, NotificationUserConfig>(
            "SELECT * FROM notification_user_configs WHERE user_id = $1 ORDER BY channel",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to list user configs", e))
    }

    async fn upsert(&self, config: &NotificationUserConfig) -> AppResult<NotificationUserConfig> {
        sqlx::query_as::<_, NotificationUserConfig>(
            "INSERT INTO notification_user_configs \
             (user_id, channel, enabled, quiet_hours_start, quiet_hours_end, frequency, muted_types, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, NOW()) \
             ON CONFLICT (user_id, channel) DO UPDATE SET \
                enabled = EXCLUDED.enabled, \
                quiet_hours_start = EXCLUDED.quiet_hours_start, \
                quiet_hours_end = EXCLUDED.quiet_hours_end, \
                frequency = EXCLUDED.frequency, \
                muted_types = EXCLUDED.muted_types, \
                updated_at = NOW() \
             RETURNING *",
        )
        .bind(config.user_id)
        .bind(config.channel)
        .bind(config.enabled)
        .bind(config.quiet_hours_start)
        .bind(config.quiet_hours_end)
        .bind(config.frequency)
        .bind(&config.muted_types)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save user config", e))
    }
}
