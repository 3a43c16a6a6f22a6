//! Delivery monitor handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use tourhub_entity::alert::AlertEvent;
use tourhub_entity::metrics::MetricsSnapshot;
use tourhub_worker::HealthReport;

use crate::dto::request::AlertQuery;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/monitor/metrics
pub async fn metrics(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<MetricsSnapshot>>> {
    let snapshot = state.monitor.collect_metrics().await?;
    Ok(Json(ApiResponse::ok(snapshot)))
}

/// GET /api/monitor/health
pub async fn health_report(
    State(state): State<AppState>,
) -> ApiResult<Json<ApiResponse<HealthReport>>> {
    let report = state.monitor.generate_health_report().await?;
    Ok(Json(ApiResponse::ok(report)))
}

/// GET /api/monitor/alerts
pub async fn alerts(
    State(state): State<AppState>,
    Query(query): Query<AlertQuery>,
) -> Json<ApiResponse<Vec<AlertEvent>>> {
    let alerts = if query.history {
        state.monitor.alert_history(query.limit).await
    } else {
        state.monitor.active_alerts().await
    };
    Json(ApiResponse::ok(alerts))
}

/// POST /api/monitor/alerts/{id}/resolve
pub async fn resolve_alert(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<AlertEvent>>> {
    let resolved = state.monitor.resolve_alert(id).await?;
    Ok(Json(ApiResponse::ok(resolved)))
}
