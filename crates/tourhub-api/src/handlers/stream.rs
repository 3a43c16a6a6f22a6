//! WebSocket feed of in-app notifications.

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, State, WebSocketUpgrade};
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use tokio::sync::broadcast::error::RecvError;
use tracing::{info, warn};
use uuid::Uuid;

use crate::state::AppState;

/// GET /api/users/{user_id}/notifications/stream (WebSocket upgrade)
pub async fn stream_handler(
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| handle_stream(state, user_id, socket))
}

async fn handle_stream(state: AppState, user_id: Uuid, socket: WebSocket) {
    let (mut ws_tx, mut ws_rx) = socket.split();
    let mut events = state.realtime.subscribe(user_id).await;

    info!(user_id = %user_id, "Notification stream opened");

    let outbound_task = tokio::spawn(async move {
        loop {
            let event = match events.recv().await {
                Ok(event) => event,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(user_id = %user_id, skipped, "Notification stream lagged");
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let Ok(payload) = serde_json::to_string(&event) else {
                continue;
            };
            if ws_tx.send(Message::Text(payload.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(result) = ws_rx.next().await {
        match result {
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "WebSocket error");
                break;
            }
        }
    }

    outbound_task.abort();
    state.realtime.prune().await;

    info!(user_id = %user_id, "Notification stream closed");
}
