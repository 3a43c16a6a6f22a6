//! Background processing for the notification engine.
//!
//! This crate provides:
//! - The notification queue: one polling tick that dispatches due records
//!   in priority order under a concurrency ceiling
//! - A runner that drives the queue until shutdown and drains in-flight sends
//! - The delivery monitor: rolling metrics, alert rules, and health reports
//! - A cron scheduler for the monitor tick and retention cleanup

pub mod monitor;
pub mod queue;
pub mod runner;
pub mod scheduler;

pub use monitor::{AlertSink, HealthReport, LogAlertSink, Monitor, NotificationAlertSink};
pub use queue::{NotificationQueue, QueueStats, TickSummary};
pub use runner::QueueRunner;
pub use scheduler::{CleanupReport, MaintenanceScheduler, RetentionCleaner};
