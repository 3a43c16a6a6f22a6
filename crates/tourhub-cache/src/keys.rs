//! Cache key builders for every TourHub cache entry.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Prefix applied to all rate-limit keys.
const RATE_LIMIT: &str = "ratelimit";

/// Counter for sends on `channel` by `user_id` within the clock hour of `at`.
pub fn hourly_quota(channel: &str, user_id: Uuid, at: DateTime<Utc>) -> String {
    format!("{RATE_LIMIT}:{channel}:{user_id}:h:{}", at.format("%Y%m%d%H"))
}

/// Counter for sends on `channel` by `user_id` within the UTC day of `at`.
pub fn daily_quota(channel: &str, user_id: Uuid, at: DateTime<Utc>) -> String {
    format!("{RATE_LIMIT}:{channel}:{user_id}:d:{}", at.format("%Y%m%d"))
}
