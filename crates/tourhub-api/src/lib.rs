//! # tourhub-api
//!
//! HTTP API layer for the TourHub notification engine built on Axum.
//!
//! Provides the notification, inbox, preference, business-event, monitor and
//! queue endpoints, CORS and request logging middleware, DTOs, and error
//! mapping. [`app::run_server`] wires every component and serves them.

pub mod app;
pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use app::{build_app, run_server};
pub use error::{ApiError, ApiResult};
pub use state::AppState;
