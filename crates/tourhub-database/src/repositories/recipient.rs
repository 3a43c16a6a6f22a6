//! Read-only access to recipient contacts, devices, and orders.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_entity::recipient::{DeviceToken, OrderSummary, RecipientContact};

/// Lookups against the site's user and order tables.
#[async_trait]
pub trait RecipientRepository: Send + Sync {
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<RecipientContact>>;

    /// Active push devices for a user.
    async fn device_tokens(&self, user_id: Uuid) -> AppResult<Vec<DeviceToken>>;

    async fn find_order(&self, order_id: Uuid) -> AppResult<Option<OrderSummary>>;
}

/// PostgreSQL implementation of [`RecipientRepository`].
#[derive(Debug, Clone)]
pub struct PgRecipientRepository {
    pool: PgPool,
}

impl PgRecipientRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientRepository for PgRecipientRepository {
    async fn find_contact(&self, user_id: Uuid) -> AppResult<Option<RecipientContact>> {
        sqlx::query_as::<_, RecipientContact>(
            "SELECT id AS user_id, display_name, phone, email FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load recipient", e))
    }

    async fn device_tokens(&self, user_id: Uuid) -> AppResult<Vec<DeviceToken>> {
        sqlx::query_as::<_, DeviceToken>(
            "SELECT user_id, token, platform FROM user_devices \
             WHERE user_id = $1 AND active = TRUE ORDER BY created_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load device tokens", e))
    }

    async fn find_order(&self, order_id: Uuid) -> AppResult<Option<OrderSummary>> {
        sqlx::query_as::<_, OrderSummary>(
            "SELECT id AS order_id, user_id, order_number, total_amount::float8 AS total_amount, \
                    booking_date, contact_name, contact_phone, contact_email \
             FROM orders WHERE id = $1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to load order", e))
    }
}
