//! The notification queue: one polling tick over due records.

use std::cmp::Reverse;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Semaphore, watch};
use tokio::task::{JoinError, JoinSet};

use tourhub_core::config::queue::QueueConfig;
use tourhub_core::result::AppResult;
use tourhub_database::repositories::NotificationRepository;
use tourhub_entity::metrics::StatusCounts;
use tourhub_entity::notification::{Notification, NotificationPriority};
use tourhub_service::{DeliveryOutcome, DeliveryProcessor};

/// Counts from one queue tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TickSummary {
    /// Lapsed claims folded back into the failure path.
    pub recovered: usize,
    /// Due records fetched this tick.
    pub due: usize,
    pub delivered: usize,
    pub retrying: usize,
    pub failed: usize,
    pub skipped: usize,
    /// Records whose processing hit a storage error or panicked.
    pub errors: usize,
}

impl TickSummary {
    fn record(&mut self, joined: Result<AppResult<DeliveryOutcome>, JoinError>) {
        match joined {
            Ok(Ok(DeliveryOutcome::Delivered { .. })) => self.delivered += 1,
            Ok(Ok(DeliveryOutcome::Retrying { .. })) => self.retrying += 1,
            Ok(Ok(DeliveryOutcome::Failed { .. })) => self.failed += 1,
            Ok(Ok(DeliveryOutcome::Skipped)) => self.skipped += 1,
            Ok(Err(e)) => {
                tracing::warn!("Notification processing failed: {}", e);
                self.errors += 1;
            }
            Err(e) => {
                tracing::error!("Notification worker task aborted: {}", e);
                self.errors += 1;
            }
        }
    }

    /// Number of records that reached a send attempt.
    pub fn attempted(&self) -> usize {
        self.delivered + self.retrying + self.failed
    }
}

/// Record counts per status, as served by `GET /api/queue/stats`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub pending: i64,
    pub sent: i64,
    pub delivered: i64,
    pub failed: i64,
    pub total: i64,
}

impl From<StatusCounts> for QueueStats {
    fn from(counts: StatusCounts) -> Self {
        Self {
            pending: counts.pending,
            sent: counts.sent,
            delivered: counts.delivered,
            failed: counts.failed,
            total: counts.total(),
        }
    }
}

/// Priority a record is dispatched at. With aging enabled, a record that has
/// waited past `aging` since its scheduled time sorts one level higher.
pub fn effective_priority(
    record: &Notification,
    now: DateTime<Utc>,
    aging: Option<chrono::Duration>,
) -> NotificationPriority {
    match aging {
        Some(after) if record.scheduled_at + after <= now => record.priority.raised(),
        _ => record.priority,
    }
}

/// Order due records for dispatch: priority descending, then oldest
/// `scheduled_at` first.
pub fn dispatch_order(
    mut records: Vec<Notification>,
    now: DateTime<Utc>,
    aging: Option<chrono::Duration>,
) -> Vec<Notification> {
    records.sort_by_key(|r| (Reverse(effective_priority(r, now, aging)), r.scheduled_at));
    records
}

/// Polls due notifications and hands them to the [`DeliveryProcessor`].
pub struct NotificationQueue {
    notifications: Arc<dyn NotificationRepository>,
    processor: Arc<DeliveryProcessor>,
    config: QueueConfig,
}

impl std::fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("processor", &self.processor)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl NotificationQueue {
    /// Creates a new queue
    pub fn new(
        notifications: Arc<dyn NotificationRepository>,
        processor: Arc<DeliveryProcessor>,
        config: QueueConfig,
    ) -> Self {
        Self {
            notifications,
            processor,
            config,
        }
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Identity used when claiming records.
    pub fn worker_id(&self) -> &str {
        self.processor.worker_id()
    }

    fn aging(&self) -> Option<chrono::Duration> {
        (self.config.aging_after_seconds > 0)
            .then(|| chrono::Duration::seconds(self.config.aging_after_seconds as i64))
    }

    /// Run one polling tick.
    ///
    /// Recovers lapsed claims, fetches up to `batch_size` due records and
    /// dispatches them chunk by chunk with at most `concurrency` sends in
    /// flight. Once `cancel` flips, no further chunk starts and in-flight
    /// sends get `drain_timeout_seconds` before they are aborted.
    ///
    /// Returns an error only when the store could not be read.
    pub async fn tick(&self, cancel: &watch::Receiver<bool>) -> AppResult<TickSummary> {
        let now = Utc::now();
        let mut summary = TickSummary {
            recovered: self
                .processor
                .recover_expired(now, self.config.batch_size)
                .await?,
            ..TickSummary::default()
        };

        let due = self
            .notifications
            .find_due(now, self.config.batch_size)
            .await?;
        summary.due = due.len();
        if due.is_empty() {
            return Ok(summary);
        }

        let ordered = dispatch_order(due, now, self.aging());
        let semaphore = Arc::new(Semaphore::new(self.config.concurrency.max(1)));
        let mut tasks: JoinSet<AppResult<DeliveryOutcome>> = JoinSet::new();
        let mut cancelled = false;

        for chunk in ordered.chunks(self.config.chunk_size.max(1)) {
            if *cancel.borrow() {
                cancelled = true;
                break;
            }
            for record in chunk {
                let Ok(permit) = semaphore.clone().acquire_owned().await else {
                    break;
                };
                let processor = Arc::clone(&self.processor);
                let id = record.id;
                tasks.spawn(async move {
                    let outcome = processor.process(id).await;
                    drop(permit);
                    outcome
                });
            }
        }

        if cancelled || *cancel.borrow() {
            let drain = Duration::from_secs(self.config.drain_timeout_seconds);
            tracing::info!(
                "Queue tick interrupted, draining {} in-flight sends (timeout {}s)",
                tasks.len(),
                drain.as_secs()
            );
            if tokio::time::timeout(drain, collect(&mut tasks, &mut summary))
                .await
                .is_err()
            {
                tracing::warn!(
                    "Drain timed out; aborting {} sends, their claims will be recovered",
                    tasks.len()
                );
                tasks.abort_all();
            }
        } else {
            collect(&mut tasks, &mut summary).await;
        }

        Ok(summary)
    }

    /// Current record counts per status.
    pub async fn stats(&self) -> AppResult<QueueStats> {
        Ok(self.notifications.count_by_status().await?.into())
    }
}

async fn collect(tasks: &mut JoinSet<AppResult<DeliveryOutcome>>, summary: &mut TickSummary) {
    while let Some(joined) = tasks.join_next().await {
        summary.record(joined);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tourhub_database::memory::{InMemoryNotificationRepository, InMemoryRecipientRepository};
    use tourhub_entity::notification::{
        NewNotification, NotificationChannel, NotificationStatus, NotificationType,
    };
    use tourhub_service::RetryPolicy;
    use tourhub_service::channel::{ChannelRegistry, ChannelSender, DeliveryResult, OutboundMessage};
    use uuid::Uuid;

    /// In-app sender that records the order it was called in.
    #[derive(Debug, Default)]
    struct OrderedSender {
        seen: Mutex<Vec<Uuid>>,
    }

    #[async_trait]
    impl ChannelSender for OrderedSender {
        fn channel(&self) -> NotificationChannel {
            NotificationChannel::InApp
        }

        async fn send(&self, message: &OutboundMessage) -> DeliveryResult {
            self.seen.lock().unwrap().push(message.notification_id);
            DeliveryResult::delivered(Some(message.notification_id.to_string()))
        }
    }

    struct Fixture {
        repo: Arc<InMemoryNotificationRepository>,
        sender: Arc<OrderedSender>,
        queue: NotificationQueue,
    }

    fn fixture(config: QueueConfig) -> Fixture {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let sender = Arc::new(OrderedSender::default());
        let registry = ChannelRegistry::new(Arc::new(InMemoryRecipientRepository::new()))
            .register(sender.clone());
        let processor = DeliveryProcessor::new(
            repo.clone(),
            Arc::new(registry),
            RetryPolicy::default(),
            &config,
        );
        let queue = NotificationQueue::new(repo.clone(), Arc::new(processor), config);
        Fixture { repo, sender, queue }
    }

    fn serial() -> QueueConfig {
        QueueConfig {
            concurrency: 1,
            chunk_size: 1,
            ..QueueConfig::default()
        }
    }

    async fn enqueue(
        repo: &InMemoryNotificationRepository,
        priority: NotificationPriority,
        scheduled_at: DateTime<Utc>,
    ) -> Uuid {
        repo.create(NewNotification {
            user_id: Uuid::new_v4(),
            order_id: None,
            notification_type: NotificationType::BookingReminder,
            channel: NotificationChannel::InApp,
            priority,
            title: "Trip tomorrow".into(),
            content: "Meet at the north gate at 8:00".into(),
            template_id: None,
            metadata: serde_json::json!({}),
            scheduled_at,
            max_retries: 3,
        })
        .await
        .unwrap()
        .id
    }

    fn no_cancel() -> watch::Receiver<bool> {
        watch::channel(false).1
    }

    #[tokio::test]
    async fn test_urgent_dispatched_before_low() {
        let f = fixture(serial());
        let past = Utc::now() - chrono::Duration::minutes(5);
        let low = enqueue(&f.repo, NotificationPriority::Low, past).await;
        let urgent = enqueue(&f.repo, NotificationPriority::Urgent, past).await;
        let normal = enqueue(&f.repo, NotificationPriority::Normal, past).await;

        let summary = f.queue.tick(&no_cancel()).await.unwrap();
        assert_eq!(summary.due, 3);
        assert_eq!(summary.delivered, 3);
        assert_eq!(*f.sender.seen.lock().unwrap(), vec![urgent, normal, low]);
    }

    #[tokio::test]
    async fn test_future_schedule_is_not_dispatched() {
        let f = fixture(serial());
        let later = enqueue(
            &f.repo,
            NotificationPriority::Urgent,
            Utc::now() + chrono::Duration::hours(1),
        )
        .await;

        let summary = f.queue.tick(&no_cancel()).await.unwrap();
        assert_eq!(summary.due, 0);
        assert!(f.sender.seen.lock().unwrap().is_empty());
        let record = f.repo.find_by_id(later).await.unwrap().unwrap();
        assert_eq!(record.status, NotificationStatus::Pending);
    }

    #[tokio::test]
    async fn test_terminal_records_are_not_sent_again() {
        let f = fixture(serial());
        let id = enqueue(&f.repo, NotificationPriority::High, Utc::now()).await;

        f.queue.tick(&no_cancel()).await.unwrap();
        let second = f.queue.tick(&no_cancel()).await.unwrap();

        assert_eq!(second.due, 0);
        assert_eq!(f.sender.seen.lock().unwrap().len(), 1);
        let record = f.repo.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(record.status, NotificationStatus::Delivered);
    }

    #[tokio::test]
    async fn test_storage_outage_fails_the_tick() {
        let f = fixture(serial());
        enqueue(&f.repo, NotificationPriority::Normal, Utc::now()).await;
        f.repo.set_unavailable(true);
        assert!(f.queue.tick(&no_cancel()).await.is_err());
    }

    #[tokio::test]
    async fn test_cancelled_tick_starts_no_chunk() {
        let f = fixture(serial());
        enqueue(&f.repo, NotificationPriority::Normal, Utc::now()).await;
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();

        let summary = f.queue.tick(&rx).await.unwrap();
        assert_eq!(summary.due, 1);
        assert_eq!(summary.attempted(), 0);
        assert!(f.sender.seen.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_stats_counts_by_status() {
        let f = fixture(serial());
        enqueue(&f.repo, NotificationPriority::Normal, Utc::now()).await;
        enqueue(
            &f.repo,
            NotificationPriority::Normal,
            Utc::now() + chrono::Duration::hours(2),
        )
        .await;
        f.queue.tick(&no_cancel()).await.unwrap();

        let stats = f.queue.stats().await.unwrap();
        assert_eq!(stats.delivered, 1);
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.total, 2);
    }

    #[test]
    fn test_aging_raises_one_level() {
        let now = Utc::now();
        let mut record = NewNotification {
            user_id: Uuid::new_v4(),
            order_id: None,
            notification_type: NotificationType::Promotion,
            channel: NotificationChannel::Email,
            priority: NotificationPriority::Low,
            title: "Spring sale".into(),
            content: "20% off lake cruises".into(),
            template_id: None,
            metadata: serde_json::json!({}),
            scheduled_at: now - chrono::Duration::minutes(30),
            max_retries: 3,
        }
        .into_record(Uuid::new_v4(), now);
        let aging = Some(chrono::Duration::minutes(10));

        assert_eq!(effective_priority(&record, now, None), NotificationPriority::Low);
        assert_eq!(effective_priority(&record, now, aging), NotificationPriority::Normal);
        record.priority = NotificationPriority::Urgent;
        assert_eq!(effective_priority(&record, now, aging), NotificationPriority::Urgent);
    }
}
