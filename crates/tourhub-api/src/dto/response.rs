//! Response DTOs.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Standard success response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T: Serialize> {
    /// Whether the request was successful.
    pub success: bool,
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful response.
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
        }
    }
}

/// Result of `POST /api/notifications`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatedResponse {
    /// New notification id; `None` when the user opted out of the channel.
    pub notification_id: Option<Uuid>,
    /// `"created"` or `"skipped"`.
    pub status: String,
}

/// Count response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CountResponse {
    pub count: i64,
}

/// Simple message response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

/// Liveness plus dependency checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    /// `"ok"` or `"degraded"`.
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
    /// `"connected"`, `"unavailable"`, or `"in-memory"`.
    pub database: String,
    /// `"connected"` or `"unavailable"`.
    pub cache: String,
}
