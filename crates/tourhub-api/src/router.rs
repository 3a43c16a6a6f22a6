//! Route definitions for the TourHub notification API.
//!
//! All routes are mounted under `/api` and receive `AppState` through Axum's
//! `State` extractor.

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::handlers;
use crate::state::AppState;

/// Build the API router with all routes.
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .merge(notification_routes())
        .merge(inbox_routes())
        .merge(settings_routes())
        .merge(event_routes())
        .merge(monitor_routes())
        .merge(health_routes());

    Router::new().nest("/api", api_routes).with_state(state)
}

/// Create and inspect notifications
fn notification_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/notifications",
            post(handlers::notification::create_notification),
        )
        .route(
            "/notifications/{id}",
            get(handlers::notification::get_notification),
        )
}

/// In-app notification center
fn inbox_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/notifications",
            get(handlers::inbox::list_notifications),
        )
        .route(
            "/users/{user_id}/notifications/unread-count",
            get(handlers::inbox::unread_count),
        )
        .route(
            "/users/{user_id}/notifications/stream",
            get(handlers::stream::stream_handler),
        )
        .route(
            "/users/{user_id}/notifications/read-all",
            put(handlers::inbox::mark_all_read),
        )
        .route(
            "/users/{user_id}/notifications/{id}/read",
            put(handlers::inbox::mark_read),
        )
        .route(
            "/users/{user_id}/notifications/{id}",
            delete(handlers::inbox::delete_notification),
        )
}

/// Per-channel preferences
fn settings_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/users/{user_id}/notification-settings",
            get(handlers::settings::get_settings),
        )
        .route(
            "/users/{user_id}/notification-settings/{channel}",
            put(handlers::settings::update_setting),
        )
}

/// Order and payment webhooks
fn event_routes() -> Router<AppState> {
    Router::new().route(
        "/events/orders/{order_id}",
        post(handlers::events::order_event),
    )
}

/// Metrics, alerts, and queue stats
fn monitor_routes() -> Router<AppState> {
    Router::new()
        .route("/monitor/metrics", get(handlers::monitor::metrics))
        .route("/monitor/health", get(handlers::monitor::health_report))
        .route("/monitor/alerts", get(handlers::monitor::alerts))
        .route(
            "/monitor/alerts/{id}/resolve",
            post(handlers::monitor::resolve_alert),
        )
        .route("/queue/stats", get(handlers::queue::stats))
}

/// Liveness
fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health::health))
}
