//! Application state shared across all handlers and middleware.

use std::sync::Arc;
use std::time::Instant;

use tourhub_cache::CacheManager;
use tourhub_core::config::AppConfig;
use tourhub_core::result::AppResult;
use tourhub_core::traits::cache::CacheProvider;
use tourhub_database::{DatabasePool, Repositories};
use tourhub_service::channel::ChannelRegistry;
use tourhub_service::realtime::RealtimeHub;
use tourhub_service::{
    DeliveryProcessor, NotificationService, NotificationTrigger, RetryPolicy, SecurityValidator,
};
use tourhub_worker::{AlertSink, LogAlertSink, Monitor, NotificationAlertSink, NotificationQueue};

/// Application state containing all shared dependencies.
///
/// Passed to every Axum handler via `State<AppState>`.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Application configuration
    pub config: Arc<AppConfig>,
    /// PostgreSQL pool; `None` when running on in-memory repositories
    pub db_pool: Option<DatabasePool>,
    /// Cache manager holding rate-limit counters
    pub cache: Arc<CacheManager>,
    /// Per-user realtime broadcast hub
    pub realtime: Arc<RealtimeHub>,
    /// Notification creation and inbox operations
    pub notification_service: Arc<NotificationService>,
    /// Business-event entry points
    pub trigger: Arc<NotificationTrigger>,
    /// Delivery monitor
    pub monitor: Arc<Monitor>,
    /// Notification queue
    pub queue: Arc<NotificationQueue>,
    /// Process start, for uptime
    pub started_at: Instant,
}

impl AppState {
    /// Wire services, channels, monitor and queue over `repositories`.
    pub async fn build(
        config: AppConfig,
        repositories: Repositories,
        db_pool: Option<DatabasePool>,
    ) -> AppResult<Self> {
        tracing::info!(
            "Initializing cache (provider: {})...",
            config.cache.provider
        );
        let cache = Arc::new(CacheManager::new(&config.cache).await?);

        let realtime = Arc::new(RealtimeHub::default());
        let registry = Arc::new(ChannelRegistry::from_config(
            &config.channels,
            Arc::clone(&repositories.recipients),
            Arc::clone(&realtime),
        )?);

        let processor = Arc::new(DeliveryProcessor::new(
            Arc::clone(&repositories.notifications),
            registry,
            RetryPolicy::from_config(&config.retry),
            &config.queue,
        ));
        let security = Arc::new(SecurityValidator::new(
            &config.security,
            &config.rate_limit,
            Arc::clone(&cache) as Arc<dyn CacheProvider>,
        ));
        let notification_service = Arc::new(NotificationService::new(
            &repositories,
            security,
            Arc::clone(&processor),
        ));
        let trigger = Arc::new(NotificationTrigger::new(
            Arc::clone(&notification_service),
            Arc::clone(&repositories.recipients),
            config.channels.site_base_url.clone(),
        ));

        let sink: Arc<dyn AlertSink> = if config.monitor.operator_user_ids.is_empty() {
            Arc::new(LogAlertSink)
        } else {
            Arc::new(NotificationAlertSink::new(
                Arc::clone(&notification_service),
                config.monitor.operator_user_ids.clone(),
            ))
        };
        let monitor = Arc::new(Monitor::new(
            Arc::clone(&repositories.notifications),
            sink,
            config.monitor.clone(),
        ));

        let queue = Arc::new(NotificationQueue::new(
            Arc::clone(&repositories.notifications),
            processor,
            config.queue.clone(),
        ));

        Ok(Self {
            config: Arc::new(config),
            db_pool,
            cache,
            realtime,
            notification_service,
            trigger,
            monitor,
            queue,
            started_at: Instant::now(),
        })
    }
}
