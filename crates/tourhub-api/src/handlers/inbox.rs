//! In-app notification center handlers.

use axum::Json;
use axum::extract::{Path, Query, State};
use uuid::Uuid;

use tourhub_core::types::pagination::PageResponse;
use tourhub_entity::notification::Notification;

use crate::dto::request::InboxQuery;
use crate::dto::response::{ApiResponse, CountResponse, MessageResponse};
use crate::error::ApiResult;
use crate::extractors::PaginationParams;
use crate::state::AppState;

/// GET /api/users/{user_id}/notifications
pub async fn list_notifications(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    Query(page): Query<PaginationParams>,
    Query(filter): Query<InboxQuery>,
) -> ApiResult<Json<ApiResponse<PageResponse<Notification>>>> {
    let result = state
        .notification_service
        .list_for_user(user_id, page.into_page_request(), filter.unread_only)
        .await?;
    Ok(Json(ApiResponse::ok(result)))
}

/// GET /api/users/{user_id}/notifications/unread-count
pub async fn unread_count(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let count = state.notification_service.unread_count(user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse { count })))
}

/// PUT /api/users/{user_id}/notifications/{id}/read
pub async fn mark_read(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.notification_service.mark_read(user_id, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Marked as read".to_string(),
    })))
}

/// PUT /api/users/{user_id}/notifications/read-all
pub async fn mark_all_read(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<ApiResponse<CountResponse>>> {
    let count = state.notification_service.mark_all_read(user_id).await?;
    Ok(Json(ApiResponse::ok(CountResponse {
        count: count as i64,
    })))
}

/// DELETE /api/users/{user_id}/notifications/{id}
pub async fn delete_notification(
    State(state): State<AppState>,
    Path((user_id, id)): Path<(Uuid, Uuid)>,
) -> ApiResult<Json<ApiResponse<MessageResponse>>> {
    state.notification_service.delete_in_app(user_id, id).await?;
    Ok(Json(ApiResponse::ok(MessageResponse {
        message: "Deleted".to_string(),
    })))
}
