//! Per-user, per-channel delivery preferences.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;
use uuid::Uuid;

use super::kind::{NotificationChannel, NotificationType};

/// How often a user wants to hear from a channel. Stored and exposed to the
/// notification center; the engine itself delivers in real time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "delivery_frequency", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DeliveryFrequency {
    #[default]
    Realtime,
    HourlyDigest,
    DailyDigest,
}

/// Opt-in flag and preferences for one (user, channel) pair.
///
/// A missing row is equivalent to [`NotificationUserConfig::default_for`].
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct NotificationUserConfig {
    /// The user these preferences belong to.
    pub user_id: Uuid,
    /// The channel they apply to.
    pub channel: NotificationChannel,
    /// Whether the user accepts this channel at all.
    pub enabled: bool,
    /// Start of the quiet window (hour of day, UTC).
    pub quiet_hours_start: Option<i16>,
    /// End of the quiet window (hour of day, UTC, exclusive).
    pub quiet_hours_end: Option<i16>,
    /// Preferred delivery cadence.
    pub frequency: DeliveryFrequency,
    /// Categories the user muted on this channel.
    pub muted_types: Json<Vec<NotificationType>>,
    /// When preferences were last updated.
    pub updated_at: DateTime<Utc>,
}

impl NotificationUserConfig {
    /// Defaults for a user with no stored row: enabled, no quiet hours.
    pub fn default_for(user_id: Uuid, channel: NotificationChannel) -> Self {
        Self {
            user_id,
            channel,
            enabled: true,
            quiet_hours_start: None,
            quiet_hours_end: None,
            frequency: DeliveryFrequency::Realtime,
            muted_types: Json(Vec::new()),
            updated_at: Utc::now(),
        }
    }

    /// Replace the muted categories.
    pub fn set_muted_types(&mut self, types: Vec<NotificationType>) {
        self.muted_types = Json(types);
    }

    /// Check if a notification of `kind` may be delivered on this channel.
    pub fn accepts(&self, kind: NotificationType) -> bool {
        self.enabled && !self.muted_types.contains(&kind)
    }

    fn quiet_window(&self) -> Option<(u32, u32)> {
        let start = u32::try_from(self.quiet_hours_start?).ok()?;
        let end = u32::try_from(self.quiet_hours_end?).ok()?;
        if start == end || start > 23 || end > 23 {
            return None;
        }
        Some((start, end))
    }

    /// Check if `at` falls inside the quiet window. Windows may wrap midnight.
    pub fn is_quiet_at(&self, at: DateTime<Utc>) -> bool {
        let Some((start, end)) = self.quiet_window() else {
            return false;
        };
        let hour = at.hour();
        if start < end {
            hour >= start && hour < end
        } else {
            hour >= start || hour < end
        }
    }

    /// If `at` is inside the quiet window, return when the window ends.
    pub fn quiet_window_end(&self, at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !self.is_quiet_at(at) {
            return None;
        }
        let (_, end) = self.quiet_window()?;
        let end_time = NaiveTime::from_hms_opt(end, 0, 0)?;
        let today = Utc.from_utc_datetime(&at.date_naive().and_time(end_time));
        if today > at {
            Some(today)
        } else {
            Some(today + Duration::days(1))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at_hour(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 5, 1, hour, 30, 0).unwrap()
    }

    fn with_quiet(start: i16, end: i16) -> NotificationUserConfig {
        let mut cfg = NotificationUserConfig::default_for(Uuid::new_v4(), NotificationChannel::Sms);
        cfg.quiet_hours_start = Some(start);
        cfg.quiet_hours_end = Some(end);
        cfg
    }

    #[test]
    fn test_default_accepts_everything() {
        let cfg = NotificationUserConfig::default_for(Uuid::new_v4(), NotificationChannel::Email);
        assert!(cfg.accepts(NotificationType::Promotion));
        assert!(!cfg.is_quiet_at(at_hour(3)));
    }

    #[test]
    fn test_muted_type_is_rejected() {
        let mut cfg = NotificationUserConfig::default_for(Uuid::new_v4(), NotificationChannel::Email);
        cfg.muted_types = Json(vec![NotificationType::Promotion]);
        assert!(!cfg.accepts(NotificationType::Promotion));
        assert!(cfg.accepts(NotificationType::OrderConfirmed));
    }

    #[test]
    fn test_quiet_window_wrapping_midnight() {
        let cfg = with_quiet(22, 7);
        assert!(cfg.is_quiet_at(at_hour(23)));
        assert!(cfg.is_quiet_at(at_hour(2)));
        assert!(!cfg.is_quiet_at(at_hour(12)));

        let end = cfg.quiet_window_end(at_hour(23)).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 5, 2, 7, 0, 0).unwrap());
        let end = cfg.quiet_window_end(at_hour(2)).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 5, 1, 7, 0, 0).unwrap());
    }

    #[test]
    fn test_same_day_window() {
        let cfg = with_quiet(12, 14);
        assert!(cfg.is_quiet_at(at_hour(13)));
        assert!(!cfg.is_quiet_at(at_hour(14)));
        assert!(cfg.quiet_window_end(at_hour(15)).is_none());
    }
}
