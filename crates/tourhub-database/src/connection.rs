//! PostgreSQL connection pool management.

use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use tourhub_core::config::database::DatabaseConfig;
use tourhub_core::error::{AppError, ErrorKind};

/// Wrapper around the sqlx PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    /// Open a pool from configuration, optionally applying migrations.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, AppError> {
        info!(
            url = %mask_password(&config.url),
            max_connections = config.max_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_seconds))
            .idle_timeout(Duration::from_secs(config.idle_timeout_seconds))
            .connect(&config.url)
            .await
            .map_err(|e| {
                AppError::with_source(
                    ErrorKind::Database,
                    format!("Failed to connect to database: {e}"),
                    e,
                )
            })?;

        let db = Self { pool };
        if config.run_migrations {
            db.migrate().await?;
        }
        Ok(db)
    }

    /// Apply the embedded schema migrations under `migrations/`.
    pub async fn migrate(&self) -> Result<(), AppError> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| {
                AppError::with_source(ErrorKind::Database, format!("Migration failed: {e}"), e)
            })?;
        info!("Notification schema is up to date");
        Ok(())
    }

    /// Return a reference to the underlying sqlx pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, i32>("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|v| v == 1)
            .map_err(|e| AppError::with_source(ErrorKind::Database, "Health check failed", e))
    }

    /// Close all connections in the pool.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("Database pool closed");
    }
}

/// Replace the password in a connection URL with `****`.
fn mask_password(url: &str) -> String {
    let Some(at) = url.rfind('@') else {
        return url.to_string();
    };
    let scheme_end = url.find("://").map(|p| p + 3).unwrap_or(0);
    match url[scheme_end..at].find(':') {
        Some(offset) => {
            let colon = scheme_end + offset;
            format!("{}:****{}", &url[..colon], &url[at..])
        }
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_password() {
        assert_eq!(
            mask_password("postgres://tour:s3cret@db:5432/tourhub"),
            "postgres://tour:****@db:5432/tourhub"
        );
        assert_eq!(
            mask_password("postgres://db:5432/tourhub"),
            "postgres://db:5432/tourhub"
        );
        assert_eq!(
            mask_password("postgres://tour@db/tourhub"),
            "postgres://tour@db/tourhub"
        );
    }
}
