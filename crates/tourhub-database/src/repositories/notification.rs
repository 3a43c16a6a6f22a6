//! Notification repository: creation, the dispatch state machine, the
//! in-app read surface, and metric aggregates.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use tourhub_core::error::{AppError, ErrorKind};
use tourhub_core::result::AppResult;
use tourhub_core::types::pagination::{PageRequest, PageResponse};
use tourhub_entity::metrics::{ErrorCount, StatusBreakdownRow, StatusCounts};
use tourhub_entity::notification::{NewNotification, Notification, NotificationStatus};

/// Storage contract for notification records.
///
/// State-changing dispatch methods are conditional updates: they return
/// `false` (or `None`) when the row is no longer in the state the caller
/// expected, which is how a lost race surfaces.
#[async_trait]
pub trait NotificationRepository: Send + Sync {
    /// Insert a new `PENDING` record.
    async fn create(&self, data: NewNotification) -> AppResult<Notification>;

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>>;

    /// `PENDING` records with `scheduled_at <= now`, most urgent first.
    async fn find_due(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Notification>>;

    /// Move a due record `PENDING -> SENT` and take the dispatch lease.
    ///
    /// Returns `None` if another worker got there first or the record is not
    /// due. `sent_at` is only written on the first claim.
    async fn claim(
        &self,
        id: Uuid,
        worker_id: &str,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> AppResult<Option<Notification>>;

    /// `SENT -> DELIVERED`, clearing `error_message` and the lease.
    async fn mark_delivered(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        external_id: Option<&str>,
        delivered_at: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// `SENT -> PENDING` with `retry_count + 1`, only while retries remain.
    async fn schedule_retry(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        error_message: &str,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// `SENT -> FAILED` (terminal).
    async fn mark_failed(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool>;

    /// `SENT` records whose lease lapsed before an outcome was written.
    async fn find_expired_claims(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>>;

    /// In-app notifications for a user, newest first.
    async fn list_in_app(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>>;

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64>;

    /// Set `read_at` once. Returns `false` if no such in-app record exists for the user.
    async fn mark_read(&self, user_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool>;

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<u64>;

    async fn delete_in_app(&self, user_id: Uuid, id: Uuid) -> AppResult<bool>;

    /// Current record counts per status, unbounded by time.
    async fn count_by_status(&self) -> AppResult<StatusCounts>;

    /// Counts grouped by channel, type and status for records created since `since`.
    async fn status_breakdown(&self, since: DateTime<Utc>) -> AppResult<Vec<StatusBreakdownRow>>;

    /// Mean `delivered_at - created_at` in milliseconds over delivered records.
    async fn average_delivery_ms(&self, since: DateTime<Utc>) -> AppResult<Option<f64>>;

    /// Most frequent error messages.
    async fn top_errors(&self, since: DateTime<Utc>, limit: i64) -> AppResult<Vec<ErrorCount>>;

    /// Delete terminally failed records last touched before `before`.
    async fn delete_failed_before(&self, before: DateTime<Utc>) -> AppResult<u64>;

    /// Delete in-app records read before `before`.
    async fn delete_read_before(&self, before: DateTime<Utc>) -> AppResult<u64>;
}

/// PostgreSQL implementation of [`NotificationRepository`].
#[derive(Debug, Clone)]
pub struct PgNotificationRepository {
    pool: PgPool,
}

impl PgNotificationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn db_error(message: &'static str) -> impl FnOnce(sqlx::Error) -> AppError {
    move |e| AppError::with_source(ErrorKind::Database, message, e)
}

const PRIORITY_ORDER: &str = "CASE priority \
     WHEN 'urgent' THEN 0 WHEN 'high' THEN 1 WHEN 'normal' THEN 2 WHEN 'low' THEN 3 END";

#[async_trait]
impl NotificationRepository for PgNotificationRepository {
    async fn create(&self, data: NewNotification) -> AppResult<Notification> {
        sqlx::query_as::<_, Notification>(
            "INSERT INTO notifications \
             (id, user_id, order_id, notification_type, channel, priority, status, title, content, \
              template_id, metadata, scheduled_at, retry_count, max_retries, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, 'pending', $7, $8, $9, $10, $11, 0, $12, $13, $13) \
             RETURNING *",
        )
        .bind(Uuid::now_v7())
        .bind(data.user_id)
        .bind(data.order_id)
        .bind(data.notification_type)
        .bind(data.channel)
        .bind(data.priority)
        .bind(&data.title)
        .bind(&data.content)
        .bind(data.template_id)
        .bind(&data.metadata)
        .bind(data.scheduled_at)
        .bind(data.max_retries.max(0))
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to create notification"))
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>("SELECT * FROM notifications WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_error("Failed to find notification"))
    }

    async fn find_due(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Notification>> {
        let sql = format!(
            "SELECT * FROM notifications \
             WHERE status = 'pending' AND scheduled_at <= $1 \
             ORDER BY {PRIORITY_ORDER}, scheduled_at ASC \
             LIMIT $2"
        );
        sqlx::query_as::<_, Notification>(&sql)
            .bind(now)
            .bind(limit)
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("Failed to query due notifications"))
    }

    async fn claim(
        &self,
        id: Uuid,
        worker_id: &str,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        sqlx::query_as::<_, Notification>(
            "UPDATE notifications \
             SET status = 'sent', sent_at = COALESCE(sent_at, $2), claimed_by = $3, \
                 claim_expires_at = $4, updated_at = $2 \
             WHERE id = $1 AND status = 'pending' AND scheduled_at <= $2 \
             RETURNING *",
        )
        .bind(id)
        .bind(now)
        .bind(worker_id)
        .bind(lease_until)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("Failed to claim notification"))
    }

    async fn mark_delivered(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        external_id: Option<&str>,
        delivered_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'delivered', delivered_at = $3, external_id = $4, error_message = NULL, \
                 claimed_by = NULL, claim_expires_at = NULL, updated_at = $3 \
             WHERE id = $1 AND status = 'sent' AND claimed_by IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(claimed_by)
        .bind(delivered_at)
        .bind(external_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark notification delivered"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn schedule_retry(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        error_message: &str,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'pending', retry_count = retry_count + 1, scheduled_at = $4, \
                 last_retry_at = $5, error_message = $3, claimed_by = NULL, \
                 claim_expires_at = NULL, updated_at = $5 \
             WHERE id = $1 AND status = 'sent' AND claimed_by IS NOT DISTINCT FROM $2 \
               AND retry_count < max_retries",
        )
        .bind(id)
        .bind(claimed_by)
        .bind(error_message)
        .bind(next_attempt_at)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to schedule notification retry"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications \
             SET status = 'failed', error_message = $3, claimed_by = NULL, \
                 claim_expires_at = NULL, updated_at = $4 \
             WHERE id = $1 AND status = 'sent' AND claimed_by IS NOT DISTINCT FROM $2",
        )
        .bind(id)
        .bind(claimed_by)
        .bind(error_message)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark notification failed"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn find_expired_claims(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE status = 'sent' AND claim_expires_at < $1 \
             ORDER BY claim_expires_at ASC LIMIT $2",
        )
        .bind(now)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to query expired claims"))
    }

    async fn list_in_app(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND channel = 'in_app' AND ($2 = FALSE OR read_at IS NULL)",
        )
        .bind(user_id)
        .bind(unread_only)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count notifications"))?;

        let items = sqlx::query_as::<_, Notification>(
            "SELECT * FROM notifications \
             WHERE user_id = $1 AND channel = 'in_app' AND ($2 = FALSE OR read_at IS NULL) \
             ORDER BY created_at DESC LIMIT $3 OFFSET $4",
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(page.limit() as i64)
        .bind(page.offset() as i64)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to list notifications"))?;

        Ok(PageResponse::new(items, page, total.max(0) as u64))
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications \
             WHERE user_id = $1 AND channel = 'in_app' AND read_at IS NULL",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to count unread notifications"))
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = COALESCE(read_at, $3), updated_at = $3 \
             WHERE id = $1 AND user_id = $2 AND channel = 'in_app'",
        )
        .bind(id)
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark notification read"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = $2, updated_at = $2 \
             WHERE user_id = $1 AND channel = 'in_app' AND read_at IS NULL",
        )
        .bind(user_id)
        .bind(at)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to mark notifications read"))?;
        Ok(result.rows_affected())
    }

    async fn delete_in_app(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        let result = sqlx::query(
            "DELETE FROM notifications WHERE id = $1 AND user_id = $2 AND channel = 'in_app'",
        )
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to delete notification"))?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_by_status(&self) -> AppResult<StatusCounts> {
        let rows: Vec<(NotificationStatus, i64)> =
            sqlx::query_as("SELECT status, COUNT(*) FROM notifications GROUP BY status")
                .fetch_all(&self.pool)
                .await
                .map_err(db_error("Failed to count notifications by status"))?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status, count);
        }
        Ok(counts)
    }

    async fn status_breakdown(&self, since: DateTime<Utc>) -> AppResult<Vec<StatusBreakdownRow>> {
        sqlx::query_as::<_, StatusBreakdownRow>(
            "SELECT channel, notification_type, status, COUNT(*) AS count, \
                    COUNT(*) FILTER (WHERE retry_count > 0) AS retrying \
             FROM notifications WHERE created_at >= $1 \
             GROUP BY channel, notification_type, status",
        )
        .bind(since)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to aggregate notification metrics"))
    }

    async fn average_delivery_ms(&self, since: DateTime<Utc>) -> AppResult<Option<f64>> {
        sqlx::query_scalar(
            "SELECT (AVG(EXTRACT(EPOCH FROM (delivered_at - created_at))) * 1000)::float8 \
             FROM notifications \
             WHERE status = 'delivered' AND delivered_at IS NOT NULL AND created_at >= $1",
        )
        .bind(since)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("Failed to compute average delivery time"))
    }

    async fn top_errors(&self, since: DateTime<Utc>, limit: i64) -> AppResult<Vec<ErrorCount>> {
        sqlx::query_as::<_, ErrorCount>(
            "SELECT error_message AS message, COUNT(*) AS count FROM notifications \
             WHERE created_at >= $1 AND error_message IS NOT NULL \
             GROUP BY error_message ORDER BY count DESC, message ASC LIMIT $2",
        )
        .bind(since)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("Failed to aggregate error messages"))
    }

    async fn delete_failed_before(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result =
            sqlx::query("DELETE FROM notifications WHERE status = 'failed' AND updated_at < $1")
                .bind(before)
                .execute(&self.pool)
                .await
                .map_err(db_error("Failed to delete failed notifications"))?;
        Ok(result.rows_affected())
    }

    async fn delete_read_before(&self, before: DateTime<Utc>) -> AppResult<u64> {
        let result = sqlx::query(
            "DELETE FROM notifications \
             WHERE channel = 'in_app' AND read_at IS NOT NULL AND read_at < $1",
        )
        .bind(before)
        .execute(&self.pool)
        .await
        .map_err(db_error("Failed to delete read notifications"))?;
        Ok(result.rows_affected())
    }
}
