//! Health check handler.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;

use tourhub_core::traits::cache::CacheProvider;

use crate::dto::response::{ApiResponse, HealthResponse};
use crate::state::AppState;

/// GET /api/health
///
/// Answers 503 when the database or cache does not respond.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<ApiResponse<HealthResponse>>) {
    let database = match &state.db_pool {
        Some(pool) => match pool.health_check().await {
            Ok(true) => "connected",
            _ => "unavailable",
        },
        None => "in-memory",
    };
    let cache = match state.cache.health_check().await {
        Ok(true) => "connected",
        _ => "unavailable",
    };

    let healthy = database != "unavailable" && cache != "unavailable";
    let status = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (
        status,
        Json(ApiResponse::ok(HealthResponse {
            status: if healthy { "ok" } else { "degraded" }.to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            uptime_seconds: state.started_at.elapsed().as_secs(),
            database: database.to_string(),
            cache: cache.to_string(),
        })),
    )
}
