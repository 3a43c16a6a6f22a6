//! Notification creation and status handlers.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use uuid::Uuid;
use validator::Validate;

use tourhub_entity::notification::Notification;

use crate::dto::request::CreateNotificationBody;
use crate::dto::response::{ApiResponse, CreatedResponse};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// POST /api/notifications
pub async fn create_notification(
    State(state): State<AppState>,
    Json(body): Json<CreateNotificationBody>,
) -> ApiResult<(StatusCode, Json<ApiResponse<CreatedResponse>>)> {
    body.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;

    let created = state
        .notification_service
        .create_and_send(body.into_request())
        .await?;

    let (status, label) = match created {
        Some(_) => (StatusCode::CREATED, "created"),
        None => (StatusCode::OK, "skipped"),
    };
    Ok((
        status,
        Json(ApiResponse::ok(CreatedResponse {
            notification_id: created,
            status: label.to_string(),
        })),
    ))
}

/// GET /api/notifications/{id}
pub async fn get_notification(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Notification>>> {
    let record = state.notification_service.get_status(id).await?;
    Ok(Json(ApiResponse::ok(record)))
}
