//! Queue runner: main loop that ticks the notification queue until shutdown.

use std::sync::Arc;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time;

use crate::queue::NotificationQueue;

/// Drives [`NotificationQueue::tick`] on the configured poll interval.
#[derive(Debug)]
pub struct QueueRunner {
    /// Queue being polled
    queue: Arc<NotificationQueue>,
    /// Runner identifier used in logs
    worker_id: String,
}

impl QueueRunner {
    /// Create a new queue runner
    pub fn new(queue: Arc<NotificationQueue>, worker_id: impl Into<String>) -> Self {
        Self {
            queue,
            worker_id: worker_id.into(),
        }
    }

    /// Start the runner; ticks until the cancel signal is received.
    ///
    /// A tick always runs to completion; the cancel signal is checked between
    /// ticks and between chunks inside a tick.
    pub async fn run(&self, mut cancel: watch::Receiver<bool>) {
        let config = self.queue.config();
        tracing::info!(
            "Queue runner '{}' started with concurrency={}, batch_size={}, poll_interval={}s",
            self.worker_id,
            config.concurrency,
            config.batch_size,
            config.poll_interval_seconds
        );

        let poll_interval = config.poll_interval();

        loop {
            if *cancel.borrow() {
                tracing::info!("Queue runner '{}' received shutdown signal", self.worker_id);
                break;
            }

            match self.queue.tick(&cancel).await {
                Ok(summary) if summary.due > 0 || summary.recovered > 0 => {
                    tracing::info!(
                        "Queue tick: due={}, delivered={}, retrying={}, failed={}, skipped={}, recovered={}, errors={}",
                        summary.due,
                        summary.delivered,
                        summary.retrying,
                        summary.failed,
                        summary.skipped,
                        summary.recovered,
                        summary.errors
                    );
                }
                Ok(_) => tracing::trace!("Queue tick found nothing due"),
                Err(e) => tracing::error!("Queue tick failed: {}", e),
            }

            tokio::select! {
                changed = cancel.changed() => {
                    if changed.is_err() || *cancel.borrow() {
                        tracing::info!("Queue runner '{}' shutting down", self.worker_id);
                        break;
                    }
                }
                _ = time::sleep(poll_interval) => {}
            }
        }

        tracing::info!("Queue runner '{}' shut down complete", self.worker_id);
    }

    /// Run on a background task.
    pub fn spawn(self: Arc<Self>, cancel: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move { self.run(cancel).await })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use chrono::Utc;
    use tourhub_core::config::queue::QueueConfig;
    use tourhub_database::memory::{InMemoryNotificationRepository, InMemoryRecipientRepository};
    use tourhub_database::repositories::NotificationRepository;
    use tourhub_entity::notification::{
        NewNotification, NotificationChannel, NotificationPriority, NotificationStatus,
        NotificationType,
    };
    use tourhub_service::channel::{ChannelRegistry, InAppSender};
    use tourhub_service::realtime::RealtimeHub;
    use tourhub_service::{DeliveryProcessor, RetryPolicy};
    use uuid::Uuid;

    fn runner(repo: Arc<InMemoryNotificationRepository>) -> Arc<QueueRunner> {
        let config = QueueConfig {
            poll_interval_seconds: 1,
            ..QueueConfig::default()
        };
        let registry = ChannelRegistry::new(Arc::new(InMemoryRecipientRepository::new()))
            .register(Arc::new(InAppSender::new(Arc::new(RealtimeHub::default()))));
        let processor = DeliveryProcessor::new(
            repo.clone(),
            Arc::new(registry),
            RetryPolicy::default(),
            &config,
        );
        let queue = NotificationQueue::new(repo, Arc::new(processor), config);
        Arc::new(QueueRunner::new(Arc::new(queue), "runner-test"))
    }

    #[tokio::test]
    async fn test_runner_delivers_then_stops_on_cancel() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let id = repo
            .create(NewNotification {
                user_id: Uuid::new_v4(),
                order_id: None,
                notification_type: NotificationType::OrderConfirmed,
                channel: NotificationChannel::InApp,
                priority: NotificationPriority::High,
                title: "Order confirmed".into(),
                content: "See you at West Lake".into(),
                template_id: None,
                metadata: serde_json::json!({}),
                scheduled_at: Utc::now(),
                max_retries: 3,
            })
            .await
            .unwrap()
            .id;

        let (tx, rx) = watch::channel(false);
        let handle = runner(repo.clone()).spawn(rx);

        let mut delivered = false;
        for _ in 0..50 {
            let record = repo.find_by_id(id).await.unwrap().unwrap();
            if record.status == NotificationStatus::Delivered {
                delivered = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        assert!(delivered);

        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("runner stops after cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_dropped_sender_stops_runner() {
        let repo = Arc::new(InMemoryNotificationRepository::new());
        let (tx, rx) = watch::channel(false);
        let handle = runner(repo).spawn(rx);
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), handle)
            .await
            .expect("runner stops when the signal source is gone")
            .unwrap();
    }
}
