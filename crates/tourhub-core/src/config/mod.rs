//! Application configuration schemas.
//!
//! All configuration structs are deserialized from TOML files via the
//! `config` crate. Each sub-module represents a logical configuration
//! section. Every field carries a default so a partial file (or none at
//! all) still produces a runnable configuration.

pub mod app;
pub mod cache;
pub mod channels;
pub mod database;
pub mod logging;
pub mod monitor;
pub mod queue;
pub mod security;

use serde::{Deserialize, Serialize};

use self::app::ServerConfig;
use self::cache::CacheConfig;
use self::channels::ChannelsConfig;
use self::database::DatabaseConfig;
use self::logging::LoggingConfig;
use self::monitor::{MonitorConfig, RetentionConfig};
use self::queue::{QueueConfig, RetryConfig};
use self::security::{RateLimitConfig, SecurityConfig};

use crate::error::AppError;

/// Root application configuration.
///
/// This struct is the top-level deserialization target for the merged
/// TOML configuration files (default.toml + environment overlay).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database connection settings.
    #[serde(default)]
    pub database: DatabaseConfig,
    /// Cache provider settings (rate-limit counters).
    #[serde(default)]
    pub cache: CacheConfig,
    /// Notification queue settings.
    #[serde(default)]
    pub queue: QueueConfig,
    /// Retry and backoff policy.
    #[serde(default)]
    pub retry: RetryConfig,
    /// Content validation settings.
    #[serde(default)]
    pub security: SecurityConfig,
    /// Per-channel quotas.
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    /// Channel transport endpoints.
    #[serde(default)]
    pub channels: ChannelsConfig,
    /// Monitor and alerting settings.
    #[serde(default)]
    pub monitor: MonitorConfig,
    /// Retention cleanup settings.
    #[serde(default)]
    pub retention: RetentionConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from TOML files.
    ///
    /// Merges the default configuration with an environment-specific overlay
    /// and environment variables prefixed with `TOURHUB_`
    /// (e.g. `TOURHUB__QUEUE__CONCURRENCY=20`).
    pub fn load(env: &str) -> Result<Self, AppError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{env}")).required(false))
            .add_source(
                config::Environment::with_prefix("TOURHUB")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .map_err(|e| AppError::configuration(format!("Failed to build config: {e}")))?;

        config
            .try_deserialize()
            .map_err(|e| AppError::configuration(format!("Failed to deserialize config: {e}")))
    }
}
