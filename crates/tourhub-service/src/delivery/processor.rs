//! The per-record delivery boundary.
//!
//! Every path through [`DeliveryProcessor::process`] ends with the record in
//! a state the queue understands: `DELIVERED`, `PENDING` with a later
//! `scheduled_at`, terminal `FAILED`, or untouched when the claim was lost.
//! Sender errors, panics and timeouts are folded into the failure path here.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use futures::FutureExt;
use serde::Serialize;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};
use uuid::Uuid;

use tourhub_core::config::queue::QueueConfig;
use tourhub_core::result::AppResult;
use tourhub_database::repositories::NotificationRepository;
use tourhub_entity::notification::Notification;

use super::retry::RetryPolicy;
use crate::channel::{ChannelRegistry, DeliveryResult};

/// Error recorded when a worker's claim lapsed without an outcome.
pub const LEASE_EXPIRED_MESSAGE: &str = "delivery outcome unknown: claim lease expired";

/// What happened to one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered {
        external_id: Option<String>,
    },
    Retrying {
        retry_count: i32,
        next_attempt_at: DateTime<Utc>,
        error: String,
    },
    Failed {
        error: String,
    },
    /// Not due, already claimed elsewhere, or the claim was lost mid-send.
    Skipped,
}

#[derive(Clone)]
pub struct DeliveryProcessor {
    notifications: Arc<dyn NotificationRepository>,
    registry: Arc<ChannelRegistry>,
    policy: RetryPolicy,
    worker_id: String,
    send_timeout: Duration,
    lease: chrono::Duration,
    /// Caps in-flight sends across queue ticks and inline first attempts.
    send_slots: Arc<Semaphore>,
}

impl std::fmt::Debug for DeliveryProcessor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeliveryProcessor")
            .field("worker_id", &self.worker_id)
            .field("send_timeout", &self.send_timeout)
            .field("send_slots", &self.send_slots.available_permits())
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl DeliveryProcessor {
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        registry: Arc<ChannelRegistry>,
        policy: RetryPolicy,
        queue: &QueueConfig,
    ) -> Self {
        Self {
            notifications,
            registry,
            policy,
            worker_id: format!("worker-{}", Uuid::new_v4().simple()),
            send_timeout: queue.send_timeout(),
            lease: chrono::Duration::seconds(queue.lease_seconds.max(1) as i64),
            send_slots: Arc::new(Semaphore::new(queue.concurrency.max(1))),
        }
    }

    /// Override the generated worker id.
    pub fn with_worker_id(mut self, worker_id: impl Into<String>) -> Self {
        self.worker_id = worker_id.into();
        self
    }

    pub fn worker_id(&self) -> &str {
        &self.worker_id
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Claim, send and resolve one record.
    ///
    /// Errors are storage failures only; the record is then left for lease
    /// recovery.
    pub async fn process(&self, id: Uuid) -> AppResult<DeliveryOutcome> {
        let now = Utc::now();
        let Some(claimed) = self
            .notifications
            .claim(id, &self.worker_id, now, now + self.lease)
            .await?
        else {
            debug!(notification_id = %id, "Claim not acquired; skipping");
            return Ok(DeliveryOutcome::Skipped);
        };

        let result = self.send_guarded(&claimed).await;

        if result.success {
            let sent_at = claimed.sent_at.unwrap_or(now);
            let delivered_at = result.delivered_at.unwrap_or_else(Utc::now).max(sent_at);
            let updated = self
                .notifications
                .mark_delivered(
                    claimed.id,
                    Some(&self.worker_id),
                    result.external_id.as_deref(),
                    delivered_at,
                )
                .await?;
            if !updated {
                warn!(notification_id = %claimed.id, "Claim lost before delivery was recorded");
                return Ok(DeliveryOutcome::Skipped);
            }
            info!(
                notification_id = %claimed.id,
                channel = %claimed.channel,
                attempt = claimed.retry_count + 1,
                "Notification delivered"
            );
            return Ok(DeliveryOutcome::Delivered {
                external_id: result.external_id,
            });
        }

        let error = result
            .error_message
            .unwrap_or_else(|| "delivery failed".to_string());
        self.handle_failure(&claimed, &error, Some(&self.worker_id))
            .await
    }

    /// Run the failure path for a `SENT` record held by `claimed_by`.
    pub async fn handle_failure(
        &self,
        record: &Notification,
        error: &str,
        claimed_by: Option<&str>,
    ) -> AppResult<DeliveryOutcome> {
        let now = Utc::now();

        if !record.has_retries_left() {
            let updated = self
                .notifications
                .mark_failed(record.id, claimed_by, error, now)
                .await?;
            if !updated {
                return Ok(DeliveryOutcome::Skipped);
            }
            warn!(
                notification_id = %record.id,
                channel = %record.channel,
                retries = record.retry_count,
                error = error,
                "Notification failed permanently"
            );
            return Ok(DeliveryOutcome::Failed {
                error: error.to_string(),
            });
        }

        let next_attempt_at = now + self.policy.next_delay(record.retry_count);
        let updated = self
            .notifications
            .schedule_retry(record.id, claimed_by, error, next_attempt_at, now)
            .await?;
        if !updated {
            return Ok(DeliveryOutcome::Skipped);
        }
        info!(
            notification_id = %record.id,
            channel = %record.channel,
            retry_count = record.retry_count + 1,
            next_attempt_at = %next_attempt_at,
            error = error,
            "Notification scheduled for retry"
        );
        Ok(DeliveryOutcome::Retrying {
            retry_count: record.retry_count + 1,
            next_attempt_at,
            error: error.to_string(),
        })
    }

    /// Treat lapsed claims as failed attempts. Returns how many were resolved.
    pub async fn recover_expired(&self, now: DateTime<Utc>, limit: i64) -> AppResult<usize> {
        let expired = self.notifications.find_expired_claims(now, limit).await?;
        let mut recovered = 0;
        for record in &expired {
            let outcome = self
                .handle_failure(record, LEASE_EXPIRED_MESSAGE, record.claimed_by.as_deref())
                .await?;
            if outcome != DeliveryOutcome::Skipped {
                recovered += 1;
            }
        }
        if recovered > 0 {
            warn!(recovered, "Recovered notifications with expired claims");
        }
        Ok(recovered)
    }

    async fn send_guarded(&self, record: &Notification) -> DeliveryResult {
        let Ok(_slot) = self.send_slots.acquire().await else {
            return DeliveryResult::failed("delivery slots closed");
        };
        let send = AssertUnwindSafe(self.registry.dispatch(record)).catch_unwind();
        match tokio::time::timeout(self.send_timeout, send).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => {
                let reason = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                warn!(notification_id = %record.id, reason = %reason, "Channel sender panicked");
                DeliveryResult::failed(format!("sender panicked: {reason}"))
            }
            Err(_) => {
                warn!(
                    notification_id = %record.id,
                    timeout_secs = self.send_timeout.as_secs(),
                    "Channel send timed out"
                );
                DeliveryResult::failed(format!(
                    "send timed out after {}s",
                    self.send_timeout.as_secs()
                ))
            }
        }
    }
}
