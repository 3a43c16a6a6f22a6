//! Shared wiring for engine-level tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use uuid::Uuid;

use tourhub_cache::memory::MemoryCacheProvider;
use tourhub_core::config::cache::MemoryCacheConfig;
use tourhub_core::config::channels::ChannelsConfig;
use tourhub_core::config::monitor::MonitorConfig;
use tourhub_core::config::queue::QueueConfig;
use tourhub_core::config::security::{RateLimitConfig, SecurityConfig};
use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_database::Repositories;
use tourhub_database::memory::{
    InMemoryNotificationRepository, InMemoryRecipientRepository, InMemoryTemplateRepository,
    InMemoryUserConfigRepository,
};
use tourhub_entity::alert::{AlertEvent, AlertRule};
use tourhub_entity::notification::Notification;
use tourhub_entity::recipient::{DeviceToken, OrderSummary, RecipientContact};
use tourhub_service::channel::{ChannelRegistry, Transport, TransportReceipt, TransportRequest};
use tourhub_service::realtime::RealtimeHub;
use tourhub_service::{
    DeliveryProcessor, NotificationService, NotificationTrigger, RetryPolicy, SecurityValidator,
};
use tourhub_worker::{AlertSink, Monitor, NotificationQueue, TickSummary};

/// Gateway stand-in that records every request and fails on demand.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    failing: AtomicBool,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    pub fn fail(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn deliver(&self, request: TransportRequest) -> AppResult<TransportReceipt> {
        self.requests.lock().unwrap().push(request);
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::external_service("gateway returned 502"));
        }
        Ok(TransportReceipt {
            external_id: Some(format!("gw-{}", Uuid::new_v4().simple())),
        })
    }
}

/// Alert sink that keeps what it was handed.
#[derive(Debug, Default)]
pub struct CapturingSink {
    events: Mutex<Vec<AlertEvent>>,
}

impl CapturingSink {
    pub fn fired(&self) -> Vec<AlertEvent> {
        self.events.lock().unwrap().clone()
    }
}

#[async_trait]
impl AlertSink for CapturingSink {
    async fn dispatch(&self, _rule: &AlertRule, event: &AlertEvent) -> AppResult<()> {
        self.events.lock().unwrap().push(event.clone());
        Ok(())
    }
}

/// The whole engine over in-memory stores and scripted gateways.
pub struct Engine {
    pub notifications: Arc<InMemoryNotificationRepository>,
    pub recipients: Arc<InMemoryRecipientRepository>,
    pub sms: Arc<ScriptedTransport>,
    pub email: Arc<ScriptedTransport>,
    pub push: Arc<ScriptedTransport>,
    pub hub: Arc<RealtimeHub>,
    pub service: Arc<NotificationService>,
    pub trigger: NotificationTrigger,
    pub queue: NotificationQueue,
    pub monitor: Monitor,
    pub sink: Arc<CapturingSink>,
}

impl Engine {
    pub fn new() -> Self {
        Self::with_rate_limit(RateLimitConfig::default())
    }

    pub fn with_rate_limit(rate_limit: RateLimitConfig) -> Self {
        let notifications = Arc::new(InMemoryNotificationRepository::new());
        let recipients = Arc::new(InMemoryRecipientRepository::new());
        let repositories = Repositories {
            notifications: notifications.clone(),
            user_configs: Arc::new(InMemoryUserConfigRepository::new()),
            templates: Arc::new(InMemoryTemplateRepository::new()),
            recipients: recipients.clone(),
        };

        let sms = Arc::new(ScriptedTransport::default());
        let email = Arc::new(ScriptedTransport::default());
        let push = Arc::new(ScriptedTransport::default());
        let hub = Arc::new(RealtimeHub::default());
        let channels = ChannelsConfig::default();
        let registry = Arc::new(ChannelRegistry::with_transports(
            &channels,
            repositories.recipients.clone(),
            hub.clone(),
            sms.clone(),
            email.clone(),
            push.clone(),
        ));

        // Retries become due on the next tick.
        let policy = RetryPolicy {
            base_delay: Duration::ZERO,
            multiplier: 2.0,
            max_delay: Duration::from_secs(60),
            jitter_ratio: 0.0,
            max_retries: 3,
        };
        let queue_config = QueueConfig {
            concurrency: 1,
            ..QueueConfig::default()
        };
        let processor = Arc::new(
            DeliveryProcessor::new(
                repositories.notifications.clone(),
                registry,
                policy,
                &queue_config,
            )
            .with_worker_id("engine-test"),
        );

        let cache = Arc::new(MemoryCacheProvider::new(&MemoryCacheConfig::default()));
        let security = Arc::new(SecurityValidator::new(
            &SecurityConfig::default(),
            &rate_limit,
            cache,
        ));
        let service = Arc::new(NotificationService::new(
            &repositories,
            security,
            processor.clone(),
        ));
        let trigger = NotificationTrigger::new(
            service.clone(),
            repositories.recipients.clone(),
            channels.site_base_url.clone(),
        );
        let queue = NotificationQueue::new(
            repositories.notifications.clone(),
            processor,
            queue_config,
        );
        let sink = Arc::new(CapturingSink::default());
        let monitor = Monitor::new(
            repositories.notifications.clone(),
            sink.clone(),
            MonitorConfig::default(),
        );

        Self {
            notifications,
            recipients,
            sms,
            email,
            push,
            hub,
            service,
            trigger,
            queue,
            monitor,
            sink,
        }
    }

    /// Register a traveller with a phone, an email and one device.
    pub fn traveller(&self, phone: &str) -> Uuid {
        let user_id = Uuid::new_v4();
        self.recipients.upsert_contact(RecipientContact {
            user_id,
            display_name: "Lin Wei".to_string(),
            phone: Some(phone.to_string()),
            email: Some("lin.wei@example.com".to_string()),
        });
        self.recipients.add_device(DeviceToken {
            user_id,
            token: format!("device-{}", user_id.simple()),
            platform: "ios".to_string(),
        });
        user_id
    }

    pub fn order_for(&self, user_id: Uuid) -> Uuid {
        let order_id = Uuid::new_v4();
        self.recipients.upsert_order(OrderSummary {
            order_id,
            user_id,
            order_number: "TH20260315001".to_string(),
            total_amount: 580.0,
            booking_date: chrono::NaiveDate::from_ymd_opt(2026, 11, 2),
            contact_name: Some("Lin Wei".to_string()),
            contact_phone: Some("13800138000".to_string()),
            contact_email: Some("lin.wei@example.com".to_string()),
        });
        order_id
    }

    pub async fn tick(&self) -> TickSummary {
        let (_tx, rx) = watch::channel(false);
        self.queue.tick(&rx).await.unwrap()
    }

    pub fn record(&self, id: Uuid) -> Notification {
        self.notifications
            .all()
            .into_iter()
            .find(|n| n.id == id)
            .unwrap()
    }
}
