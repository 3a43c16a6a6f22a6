//! Queue statistics handler.

use axum::Json;
use axum::extract::State;

use tourhub_worker::QueueStats;

use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// GET /api/queue/stats
pub async fn stats(State(state): State<AppState>) -> ApiResult<Json<ApiResponse<QueueStats>>> {
    let stats = state.queue.stats().await?;
    Ok(Json(ApiResponse::ok(stats)))
}
