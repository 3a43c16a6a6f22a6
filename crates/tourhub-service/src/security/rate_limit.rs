//! Hourly and daily send quotas per user and channel.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Duration as ChronoDuration, DurationRound, TimeZone, Utc};
use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use tourhub_cache::keys;
use tourhub_core::config::security::{ChannelQuota, RateLimitConfig};
use tourhub_core::error::AppError;
use tourhub_core::result::AppResult;
use tourhub_core::traits::cache::CacheProvider;
use tourhub_entity::notification::NotificationChannel;

/// Outcome of one quota check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RateLimitResult {
    pub allowed: bool,
    /// Sends left in the tighter of the two windows.
    pub remaining_quota: i64,
    /// End of the window that blocked, or of the hourly window when allowed.
    pub reset_time: DateTime<Utc>,
    /// Clock used for the check; selects the windows a release undoes.
    #[serde(skip)]
    pub checked_at: DateTime<Utc>,
}

/// Fixed-window counters stored in the cache provider.
#[derive(Debug, Clone)]
pub struct RateLimiter {
    config: RateLimitConfig,
    cache: Arc<dyn CacheProvider>,
}

impl RateLimiter {
    pub fn new(config: RateLimitConfig, cache: Arc<dyn CacheProvider>) -> Self {
        Self { config, cache }
    }

    pub fn quota_for(&self, channel: NotificationChannel) -> ChannelQuota {
        match channel {
            NotificationChannel::Sms => self.config.sms,
            NotificationChannel::Email => self.config.email,
            NotificationChannel::Push => self.config.push,
            NotificationChannel::InApp => self.config.in_app,
        }
    }

    /// Count one send against both windows.
    ///
    /// A rejected attempt is rolled back so it does not eat into the quota.
    pub async fn check(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
        now: DateTime<Utc>,
    ) -> AppResult<RateLimitResult> {
        let quota = self.quota_for(channel);
        let (hour_end, day_end) = window_ends(now)?;

        if !self.config.enabled {
            return Ok(RateLimitResult {
                allowed: true,
                remaining_quota: quota.hourly.min(quota.daily),
                reset_time: hour_end,
                checked_at: now,
            });
        }

        let hour_key = keys::hourly_quota(channel.as_str(), user_id, now);
        let day_key = keys::daily_quota(channel.as_str(), user_id, now);

        let hourly = self.bump(&hour_key, hour_end - now).await?;
        let daily = self.bump(&day_key, day_end - now).await?;

        if hourly > quota.hourly || daily > quota.daily {
            self.rollback(&hour_key).await;
            self.rollback(&day_key).await;
            let reset_time = if hourly > quota.hourly { hour_end } else { day_end };
            debug!(
                user_id = %user_id,
                channel = %channel,
                hourly,
                daily,
                "Rate limit reached"
            );
            return Ok(RateLimitResult {
                allowed: false,
                remaining_quota: 0,
                reset_time,
                checked_at: now,
            });
        }

        Ok(RateLimitResult {
            allowed: true,
            remaining_quota: (quota.hourly - hourly).min(quota.daily - daily),
            reset_time: hour_end,
            checked_at: now,
        })
    }

    /// Give back the unit consumed by an allowed `check`.
    pub async fn release(
        &self,
        user_id: Uuid,
        channel: NotificationChannel,
        granted: &RateLimitResult,
    ) {
        if !self.config.enabled || !granted.allowed {
            return;
        }
        let at = granted.checked_at;
        self.rollback(&keys::hourly_quota(channel.as_str(), user_id, at))
            .await;
        self.rollback(&keys::daily_quota(channel.as_str(), user_id, at))
            .await;
        debug!(user_id = %user_id, channel = %channel, "Rate-limit unit released");
    }

    async fn bump(&self, key: &str, ttl: ChronoDuration) -> AppResult<i64> {
        let count = self.cache.incr(key).await?;
        if count == 1 {
            let ttl = ttl.to_std().unwrap_or(Duration::from_secs(1));
            self.cache.expire(key, ttl).await?;
        }
        Ok(count)
    }

    async fn rollback(&self, key: &str) {
        if let Err(e) = self.cache.decr(key).await {
            warn!(key = key, error = %e, "Failed to roll back rate-limit counter");
        }
    }
}

/// End of the clock hour and of the UTC day containing `now`.
fn window_ends(now: DateTime<Utc>) -> AppResult<(DateTime<Utc>, DateTime<Utc>)> {
    let hour_start = now
        .duration_trunc(ChronoDuration::hours(1))
        .map_err(|e| AppError::internal(format!("Invalid rate-limit clock: {e}")))?;
    let day_start = Utc.from_utc_datetime(&now.date_naive().and_time(chrono::NaiveTime::MIN));
    Ok((
        hour_start + ChronoDuration::hours(1),
        day_start + ChronoDuration::days(1),
    ))
}
