//! Cron scheduler for the monitor tick and retention cleanup.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio_cron_scheduler::{Job as CronJob, JobScheduler};

use tourhub_core::config::monitor::{MonitorConfig, RetentionConfig};
use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_database::repositories::NotificationRepository;

use crate::monitor::Monitor;

/// Rows removed by one retention pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub failed_deleted: u64,
    pub read_deleted: u64,
}

/// Deletes terminally failed records and read in-app messages past their
/// retention period.
pub struct RetentionCleaner {
    notifications: Arc<dyn NotificationRepository>,
    config: RetentionConfig,
}

impl std::fmt::Debug for RetentionCleaner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RetentionCleaner")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl RetentionCleaner {
    pub fn new(notifications: Arc<dyn NotificationRepository>, config: RetentionConfig) -> Self {
        Self {
            notifications,
            config,
        }
    }

    /// Run one cleanup pass relative to `now`.
    pub async fn run(&self, now: DateTime<Utc>) -> AppResult<CleanupReport> {
        let failed_before = now - chrono::Duration::days(self.config.failed_after_days.max(1));
        let read_before = now - chrono::Duration::days(self.config.read_after_days.max(1));

        let report = CleanupReport {
            failed_deleted: self.notifications.delete_failed_before(failed_before).await?,
            read_deleted: self.notifications.delete_read_before(read_before).await?,
        };
        tracing::info!(
            "Retention cleanup removed {} failed and {} read notifications",
            report.failed_deleted,
            report.read_deleted
        );
        Ok(report)
    }
}

/// Cron-based scheduler for periodic maintenance
pub struct MaintenanceScheduler {
    /// The underlying job scheduler
    scheduler: JobScheduler,
}

impl std::fmt::Debug for MaintenanceScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MaintenanceScheduler").finish()
    }
}

impl MaintenanceScheduler {
    /// Create a new maintenance scheduler
    pub async fn new() -> Result<Self, AppError> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| AppError::internal(format!("Failed to create scheduler: {}", e)))?;

        Ok(Self { scheduler })
    }

    /// Register the enabled maintenance tasks
    pub async fn register_tasks(
        &self,
        monitor: Arc<Monitor>,
        monitor_config: &MonitorConfig,
        cleaner: Arc<RetentionCleaner>,
        retention_config: &RetentionConfig,
    ) -> Result<(), AppError> {
        if monitor_config.enabled {
            self.register_monitor_tick(monitor, &monitor_config.tick_cron)
                .await?;
        }
        if retention_config.enabled {
            self.register_retention_cleanup(cleaner, &retention_config.cleanup_cron)
                .await?;
        }

        tracing::info!("All scheduled tasks registered");
        Ok(())
    }

    /// Start the scheduler
    pub async fn start(&self) -> Result<(), AppError> {
        self.scheduler
            .start()
            .await
            .map_err(|e| AppError::internal(format!("Failed to start scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler started");
        Ok(())
    }

    /// Shutdown the scheduler
    pub async fn shutdown(&mut self) -> Result<(), AppError> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| AppError::internal(format!("Failed to shutdown scheduler: {}", e)))?;

        tracing::info!("Maintenance scheduler shut down");
        Ok(())
    }

    /// Metrics collection and alert evaluation
    async fn register_monitor_tick(&self, monitor: Arc<Monitor>, cron: &str) -> Result<(), AppError> {
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let monitor = Arc::clone(&monitor);
            Box::pin(async move {
                match monitor.run_tick().await {
                    Ok(fired) if !fired.is_empty() => {
                        tracing::warn!("Monitor tick fired {} alerts", fired.len());
                    }
                    Ok(_) => tracing::debug!("Monitor tick complete"),
                    Err(e) => tracing::error!("Monitor tick failed: {}", e),
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid monitor tick schedule '{}': {}", cron, e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add monitor_tick schedule: {}", e))
        })?;

        tracing::info!("Registered: monitor_tick ({})", cron);
        Ok(())
    }

    /// Retention cleanup, daily at 3 AM by default
    async fn register_retention_cleanup(
        &self,
        cleaner: Arc<RetentionCleaner>,
        cron: &str,
    ) -> Result<(), AppError> {
        let job = CronJob::new_async(cron, move |_uuid, _lock| {
            let cleaner = Arc::clone(&cleaner);
            Box::pin(async move {
                if let Err(e) = cleaner.run(Utc::now()).await {
                    tracing::error!("Retention cleanup failed: {}", e);
                }
            })
        })
        .map_err(|e| {
            AppError::configuration(format!("Invalid cleanup schedule '{}': {}", cron, e))
        })?;

        self.scheduler.add(job).await.map_err(|e| {
            AppError::internal(format!("Failed to add retention_cleanup schedule: {}", e))
        })?;

        tracing::info!("Registered: retention_cleanup ({})", cron);
        Ok(())
    }
}
