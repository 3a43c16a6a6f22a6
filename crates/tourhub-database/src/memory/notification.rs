use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_core::types::pagination::{PageRequest, PageResponse};
use tourhub_entity::metrics::{ErrorCount, StatusBreakdownRow, StatusCounts};
use tourhub_entity::notification::{
    NewNotification, Notification, NotificationChannel, NotificationStatus,
};

use crate::repositories::NotificationRepository;

/// [`NotificationRepository`] over a [`DashMap`].
#[derive(Debug, Default)]
pub struct InMemoryNotificationRepository {
    records: DashMap<Uuid, Notification>,
    unavailable: AtomicBool,
}

impl InMemoryNotificationRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every call fail with a database error until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Store a record as-is, bypassing `create`.
    pub fn insert(&self, record: Notification) {
        self.records.insert(record.id, record);
    }

    /// Copy of every stored record.
    pub fn all(&self) -> Vec<Notification> {
        self.records.iter().map(|r| r.value().clone()).collect()
    }

    fn ensure_available(&self) -> AppResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(AppError::database("notification store unavailable"));
        }
        Ok(())
    }

    /// Move a record held by `claimed_by` to `target` if that edge is legal
    /// and `update` accepts it.
    fn update_claimed(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        target: NotificationStatus,
        update: impl FnOnce(&mut Notification) -> bool,
    ) -> bool {
        match self.records.get_mut(&id) {
            Some(mut record)
                if record.status.can_transition_to(target)
                    && record.claimed_by.as_deref() == claimed_by =>
            {
                if !update(record.value_mut()) {
                    return false;
                }
                record.status = target;
                true
            }
            _ => false,
        }
    }
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn create(&self, data: NewNotification) -> AppResult<Notification> {
        self.ensure_available()?;
        let record = data.into_record(Uuid::now_v7(), Utc::now());
        self.records.insert(record.id, record.clone());
        Ok(record)
    }

    async fn find_by_id(&self, id: Uuid) -> AppResult<Option<Notification>> {
        self.ensure_available()?;
        Ok(self.records.get(&id).map(|r| r.value().clone()))
    }

    async fn find_due(&self, now: DateTime<Utc>, limit: i64) -> AppResult<Vec<Notification>> {
        self.ensure_available()?;
        let mut due: Vec<Notification> = self
            .records
            .iter()
            .filter(|r| r.is_due(now))
            .map(|r| r.value().clone())
            .collect();
        due.sort_by_key(|n| (Reverse(n.priority), n.scheduled_at));
        due.truncate(limit.max(0) as usize);
        Ok(due)
    }

    async fn claim(
        &self,
        id: Uuid,
        worker_id: &str,
        now: DateTime<Utc>,
        lease_until: DateTime<Utc>,
    ) -> AppResult<Option<Notification>> {
        self.ensure_available()?;
        let Some(mut record) = self.records.get_mut(&id) else {
            return Ok(None);
        };
        if !record.is_due(now) {
            return Ok(None);
        }
        record.status = NotificationStatus::Sent;
        record.sent_at.get_or_insert(now);
        record.claimed_by = Some(worker_id.to_string());
        record.claim_expires_at = Some(lease_until);
        record.updated_at = now;
        Ok(Some(record.clone()))
    }

    async fn mark_delivered(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        external_id: Option<&str>,
        delivered_at: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.ensure_available()?;
        Ok(self.update_claimed(id, claimed_by, NotificationStatus::Delivered, |r| {
            r.delivered_at = Some(delivered_at);
            r.external_id = external_id.map(str::to_string);
            r.error_message = None;
            r.claimed_by = None;
            r.claim_expires_at = None;
            r.updated_at = delivered_at;
            true
        }))
    }

    async fn schedule_retry(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        error_message: &str,
        next_attempt_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.ensure_available()?;
        Ok(self.update_claimed(id, claimed_by, NotificationStatus::Pending, |r| {
            if r.retry_count >= r.max_retries {
                return false;
            }
            r.retry_count += 1;
            r.scheduled_at = next_attempt_at;
            r.last_retry_at = Some(now);
            r.error_message = Some(error_message.to_string());
            r.claimed_by = None;
            r.claim_expires_at = None;
            r.updated_at = now;
            true
        }))
    }

    async fn mark_failed(
        &self,
        id: Uuid,
        claimed_by: Option<&str>,
        error_message: &str,
        now: DateTime<Utc>,
    ) -> AppResult<bool> {
        self.ensure_available()?;
        Ok(self.update_claimed(id, claimed_by, NotificationStatus::Failed, |r| {
            r.error_message = Some(error_message.to_string());
            r.claimed_by = None;
            r.claim_expires_at = None;
            r.updated_at = now;
            true
        }))
    }

    async fn find_expired_claims(
        &self,
        now: DateTime<Utc>,
        limit: i64,
    ) -> AppResult<Vec<Notification>> {
        self.ensure_available()?;
        let mut expired: Vec<Notification> = self
            .records
            .iter()
            .filter(|r| {
                r.status == NotificationStatus::Sent
                    && r.claim_expires_at.is_some_and(|at| at < now)
            })
            .map(|r| r.value().clone())
            .collect();
        expired.sort_by_key(|n| n.claim_expires_at);
        expired.truncate(limit.max(0) as usize);
        Ok(expired)
    }

    async fn list_in_app(
        &self,
        user_id: Uuid,
        unread_only: bool,
        page: PageRequest,
    ) -> AppResult<PageResponse<Notification>> {
        self.ensure_available()?;
        let mut items: Vec<Notification> = self
            .records
            .iter()
            .filter(|r| {
                r.user_id == user_id
                    && r.channel == NotificationChannel::InApp
                    && (!unread_only || r.read_at.is_none())
            })
            .map(|r| r.value().clone())
            .collect();
        items.sort_by_key(|n| Reverse((n.created_at, n.id)));
        let total = items.len() as u64;
        let items = items
            .into_iter()
            .skip(page.offset() as usize)
            .take(page.limit() as usize)
            .collect();
        Ok(PageResponse::new(items, page, total))
    }

    async fn count_unread(&self, user_id: Uuid) -> AppResult<i64> {
        self.ensure_available()?;
        Ok(self
            .records
            .iter()
            .filter(|r| r.user_id == user_id && r.is_unread())
            .count() as i64)
    }

    async fn mark_read(&self, user_id: Uuid, id: Uuid, at: DateTime<Utc>) -> AppResult<bool> {
        self.ensure_available()?;
        match self.records.get_mut(&id) {
            Some(mut r) if r.user_id == user_id && r.channel == NotificationChannel::InApp => {
                r.read_at.get_or_insert(at);
                r.updated_at = at;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, user_id: Uuid, at: DateTime<Utc>) -> AppResult<u64> {
        self.ensure_available()?;
        let mut updated = 0;
        for mut r in self.records.iter_mut() {
            if r.user_id == user_id && r.is_unread() {
                r.read_at = Some(at);
                r.updated_at = at;
                updated += 1;
            }
        }
        Ok(updated)
    }

    async fn delete_in_app(&self, user_id: Uuid, id: Uuid) -> AppResult<bool> {
        self.ensure_available()?;
        Ok(self
            .records
            .remove_if(&id, |_, r| {
                r.user_id == user_id && r.channel == NotificationChannel::InApp
            })
            .is_some())
    }

    async fn count_by_status(&self) -> AppResult<StatusCounts> {
        self.ensure_available()?;
        let mut counts = StatusCounts::default();
        for r in self.records.iter() {
            counts.add(r.status, 1);
        }
        Ok(counts)
    }

    async fn status_breakdown(&self, since: DateTime<Utc>) -> AppResult<Vec<StatusBreakdownRow>> {
        self.ensure_available()?;
        let mut groups: HashMap<(&'static str, &'static str, &'static str), StatusBreakdownRow> =
            HashMap::new();
        for r in self.records.iter().filter(|r| r.created_at >= since) {
            let key = (
                r.channel.as_str(),
                r.notification_type.as_str(),
                r.status.as_str(),
            );
            let row = groups.entry(key).or_insert_with(|| StatusBreakdownRow {
                channel: r.channel,
                notification_type: r.notification_type,
                status: r.status,
                count: 0,
                retrying: 0,
            });
            row.count += 1;
            if r.retry_count > 0 {
                row.retrying += 1;
            }
        }
        Ok(groups.into_values().collect())
    }

    async fn average_delivery_ms(&self, since: DateTime<Utc>) -> AppResult<Option<f64>> {
        self.ensure_available()?;
        let latencies: Vec<f64> = self
            .records
            .iter()
            .filter(|r| r.created_at >= since && r.status == NotificationStatus::Delivered)
            .filter_map(|r| {
                r.delivered_at
                    .map(|at| (at - r.created_at).num_milliseconds() as f64)
            })
            .collect();
        if latencies.is_empty() {
            return Ok(None);
        }
        Ok(Some(latencies.iter().sum::<f64>() / latencies.len() as f64))
    }

    async fn top_errors(&self, since: DateTime<Utc>, limit: i64) -> AppResult<Vec<ErrorCount>> {
        self.ensure_available()?;
        let mut counts: HashMap<String, i64> = HashMap::new();
        for r in self.records.iter().filter(|r| r.created_at >= since) {
            if let Some(message) = &r.error_message {
                *counts.entry(message.clone()).or_default() += 1;
            }
        }
        let mut errors: Vec<ErrorCount> = counts
            .into_iter()
            .map(|(message, count)| ErrorCount { message, count })
            .collect();
        errors.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.message.cmp(&b.message)));
        errors.truncate(limit.max(0) as usize);
        Ok(errors)
    }

    async fn delete_failed_before(&self, before: DateTime<Utc>) -> AppResult<u64> {
        self.ensure_available()?;
        let before_len = self.records.len();
        self.records
            .retain(|_, r| !(r.status == NotificationStatus::Failed && r.updated_at < before));
        Ok((before_len - self.records.len()) as u64)
    }

    async fn delete_read_before(&self, before: DateTime<Utc>) -> AppResult<u64> {
        self.ensure_available()?;
        let before_len = self.records.len();
        self.records.retain(|_, r| {
            !(r.channel == NotificationChannel::InApp && r.read_at.is_some_and(|at| at < before))
        });
        Ok((before_len - self.records.len()) as u64)
    }
}
