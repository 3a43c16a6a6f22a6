//! Application builder: wires router, middleware and state into an Axum app.

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::sync::watch;
use tower_http::compression::CompressionLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

use tourhub_core::config::AppConfig;
use tourhub_core::config::app::ServerConfig;
use tourhub_core::error::AppError;
use tourhub_database::{DatabasePool, Repositories};
use tourhub_worker::{MaintenanceScheduler, QueueRunner, RetentionCleaner};

use crate::middleware::cors::build_cors_layer;
use crate::middleware::logging::request_logging;
use crate::router::build_router;
use crate::state::AppState;

/// Builds the complete Axum application with all routes and middleware.
pub fn build_app(state: AppState, server: &ServerConfig) -> Router {
    build_router(state)
        .layer(axum::middleware::from_fn(request_logging))
        .layer(RequestBodyLimitLayer::new(server.max_body_bytes))
        .layer(CompressionLayer::new())
        .layer(build_cors_layer(server))
        .layer(TraceLayer::new_for_http())
}

/// Runs the notification server with the given configuration.
pub async fn run_server(config: AppConfig) -> Result<(), AppError> {
    tracing::info!("Starting TourHub notification server...");

    // ── Step 1: Initialize persistence ───────────────────────────
    let (db_pool, repositories) = if config.database.is_configured() {
        let pool = DatabasePool::connect(&config.database).await?;
        let repositories = Repositories::postgres(pool.pool().clone());
        (Some(pool), repositories)
    } else {
        tracing::warn!("No database URL configured, using in-memory repositories");
        (None, Repositories::in_memory())
    };
    let notifications = Arc::clone(&repositories.notifications);

    // ── Step 2: Initialize cache, channels & services ────────────
    let app_state = AppState::build(config, repositories, db_pool.clone()).await?;
    let config = Arc::clone(&app_state.config);

    // ── Step 3: Shutdown channel & queue worker ──────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let runner_handle = if config.queue.enabled {
        let queue = Arc::clone(&app_state.queue);
        let worker_id = queue.worker_id().to_string();
        let runner = Arc::new(QueueRunner::new(queue, worker_id));
        Some(runner.spawn(shutdown_rx))
    } else {
        tracing::info!("Queue worker disabled");
        None
    };

    // ── Step 4: Scheduled maintenance ────────────────────────────
    let cleaner = Arc::new(RetentionCleaner::new(
        notifications,
        config.retention.clone(),
    ));
    let mut scheduler = MaintenanceScheduler::new().await?;
    scheduler
        .register_tasks(
            Arc::clone(&app_state.monitor),
            &config.monitor,
            cleaner,
            &config.retention,
        )
        .await?;
    scheduler.start().await?;

    // ── Step 5: Build and start HTTP server ──────────────────────
    let app = build_app(app_state, &config.server);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind {}: {}", addr, e)))?;

    tracing::info!("TourHub notification server listening on {}", addr);

    let server = axum::serve(listener, app).with_graceful_shutdown(async move {
        shutdown_signal().await;
        let _ = shutdown_tx.send(true);
    });

    let served = server
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)));

    // ── Step 6: Drain ────────────────────────────────────────────
    if let Some(handle) = runner_handle {
        let grace = Duration::from_secs(config.server.shutdown_grace_seconds);
        if tokio::time::timeout(grace, handle).await.is_err() {
            tracing::warn!("Queue worker did not stop within {:?}", grace);
        }
    }
    if let Err(e) = scheduler.shutdown().await {
        tracing::warn!("Scheduler shutdown failed: {}", e);
    }
    if let Some(pool) = db_pool {
        pool.close().await;
    }

    tracing::info!("TourHub notification server stopped");
    served
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received");
}
