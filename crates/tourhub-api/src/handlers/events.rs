//! Business-event webhook handler.

use axum::Json;
use axum::extract::{Path, State};
use uuid::Uuid;

use tourhub_service::notification::TriggerReport;

use crate::dto::request::OrderEvent;
use crate::dto::response::ApiResponse;
use crate::error::ApiResult;
use crate::state::AppState;

/// POST /api/events/orders/{order_id}
pub async fn order_event(
    State(state): State<AppState>,
    Path(order_id): Path<Uuid>,
    Json(event): Json<OrderEvent>,
) -> ApiResult<Json<ApiResponse<TriggerReport>>> {
    let trigger = &state.trigger;
    let report = match event {
        OrderEvent::OrderConfirmed => trigger.order_confirmed(order_id).await?,
        OrderEvent::PaymentSucceeded { amount } => {
            trigger.payment_succeeded(order_id, amount).await?
        }
        OrderEvent::PaymentFailed { reason } => trigger.payment_failed(order_id, &reason).await?,
        OrderEvent::BookingReminder { remind_at } => {
            trigger.booking_reminder(order_id, remind_at).await?
        }
        OrderEvent::OrderCancelled { reason } => {
            trigger.order_cancelled(order_id, reason.as_deref()).await?
        }
        OrderEvent::RefundProcessed { amount } => {
            trigger.refund_processed(order_id, amount).await?
        }
    };
    Ok(Json(ApiResponse::ok(report)))
}
