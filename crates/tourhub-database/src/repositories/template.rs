//! Message template repository.

use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_entity::notification::NotificationTemplate;

/// Storage contract for [`NotificationTemplate`] rows.
#[async_trait]
pub trait TemplateRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationTemplate>>;

    async fn find_by_name(&self, name: &str) -> AppResult<Option<NotificationTemplate>>;

    /// Insert or replace a template (keyed by id).
    async fn save(&self, template: &NotificationTemplate) -> AppResult<()>;
}

/// PostgreSQL implementation of [`TemplateRepository`].
#[derive(Debug, Clone)]
pub struct PgTemplateRepository {
    pool: PgPool,
}

impl PgTemplateRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TemplateRepository for PgTemplateRepository {
    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<NotificationTemplate>> {
        sqlx::query_as::<_, NotificationTemplate>(
            "SELECT * FROM notification_templates WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find template", e))
    }

    async fn find_by_name(&self, name: &str) -> AppResult<Option<NotificationTemplate>> {
        sqlx::query_as::<_, NotificationTemplate>(
            "SELECT * FROM notification_templates WHERE name = $1",
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to find template", e))
    }

    async fn save(&self, template: &NotificationTemplate) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO notification_templates \
             (id, name, notification_type, channel, title_template, content_template, enabled, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, NOW()) \
             ON CONFLICT (id) DO UPDATE SET \
                name = EXCLUDED.name, \
                notification_type = EXCLUDED.notification_type, \
                channel = EXCLUDED.channel, \
                title_template = EXCLUDED.title_template, \
                content_template = EXCLUDED.content_template, \
                enabled = EXCLUDED.enabled, \
                updated_at = NOW()",
        )
        .bind(template.id)
        .bind(&template.name)
        .bind(template.notification_type)
        .bind(template.channel)
        .bind(&template.title_template)
        .bind(&template.content_template)
        .bind(template.enabled)
        .bind(template.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::with_source(ErrorKind::Database, "Failed to save template", e))?;
        Ok(())
    }
}
