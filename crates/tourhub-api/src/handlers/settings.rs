//! Per-channel preference handlers.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;
use validator::Validate;

use tourhub_entity::notification::{NotificationChannel, NotificationUserConfig};

use crate::dto::request::UpdateUserConfigBody;
use crate::dto::response::ApiResponse;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// GET /api/users/{user_id}/notification-settings
pub async fn get_settings(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<Vec<NotificationUserConfig>>>> {
    let configs = state.notification_service.get_user_configs(user_id).await?;
    Ok(Json(ApiResponse::ok(configs)))
}

/// PUT /api/users/{user_id}/notification-settings/{channel}
pub async fn update_setting(
    State(state): State<AppState>,
    Path((user_id, channel)): Path<(Uuid, NotificationChannel)>,
    Json(body): Json<UpdateUserConfigBody>,
) -> ApiResult<Json<ApiResponse<NotificationUserConfig>>> {
    body.validate()
        .map_err(|e| ApiError::bad_request(e.to_string()))?;
    let saved = state
        .notification_service
        .update_user_config(body.into_config(user_id, channel))
        .await?;
    Ok(Json(ApiResponse::ok(saved)))
}
