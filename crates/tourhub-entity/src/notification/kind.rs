//! Notification channel, priority, status, and type enumerations.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use tourhub_core::error::AppError;

/// A delivery transport.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_channel", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    /// Text message to a mobile number.
    Sms,
    /// HTML email.
    Email,
    /// Message shown in the site's notification center.
    InApp,
    /// Mobile push to every registered device.
    Push,
}

impl NotificationChannel {
    /// Every channel, in display order.
    pub const ALL: [Self; 4] = [Self::Sms, Self::Email, Self::InApp, Self::Push];

    /// Return the channel as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "sms",
            Self::Email => "email",
            Self::InApp => "in_app",
            Self::Push => "push",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            "in_app" | "inapp" | "in-app" => Ok(Self::InApp),
            "push" => Ok(Self::Push),
            other => Err(AppError::validation(format!(
                "Unknown notification channel: '{other}'"
            ))),
        }
    }
}

/// Dispatch priority. Only affects ordering within a queue tick.
///
/// Variants are declared lowest first so the derived `Ord` sorts
/// `Urgent` above `Low`.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    sqlx::Type,
)]
#[sqlx(type_name = "notification_priority", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl NotificationPriority {
    /// The next level up, saturating at `Urgent`.
    pub fn raised(&self) -> Self {
        match self {
            Self::Low => Self::Normal,
            Self::Normal => Self::High,
            Self::High | Self::Urgent => Self::Urgent,
        }
    }

    /// Return the priority as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Normal => "normal",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for NotificationPriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Delivery state of a notification.
///
/// ```text
/// PENDING -> SENT -> DELIVERED
///              |
///              +---> FAILED      (retries exhausted)
///              +---> PENDING     (retry scheduled)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationStatus {
    /// Waiting for its `scheduled_at` and a queue tick.
    Pending,
    /// Claimed by a worker; a send attempt is in flight.
    Sent,
    /// The channel accepted the message.
    Delivered,
    /// Retries exhausted.
    Failed,
}

impl NotificationStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [Self; 4] = [Self::Pending, Self::Sent, Self::Delivered, Self::Failed];

    /// Check if no further automatic transition occurs from this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Delivered | Self::Failed)
    }

    /// Check whether moving to `next` is a legal edge of the state machine.
    pub fn can_transition_to(&self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Sent)
                | (Self::Sent, Self::Delivered)
                | (Self::Sent, Self::Failed)
                | (Self::Sent, Self::Pending)
        )
    }

    /// Return the status as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Sent => "sent",
            Self::Delivered => "delivered",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for NotificationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Business category of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationType {
    OrderConfirmed,
    OrderCancelled,
    PaymentSuccess,
    PaymentFailed,
    RefundProcessed,
    BookingReminder,
    SystemAnnouncement,
    Promotion,
    SecurityAlert,
    SystemAlert,
}

impl NotificationType {
    /// Channels this type may be delivered on, regardless of user preference.
    pub fn allowed_channels(&self) -> &'static [NotificationChannel] {
        use NotificationChannel::{Email, InApp, Push, Sms};
        match self {
            Self::OrderConfirmed
            | Self::OrderCancelled
            | Self::PaymentSuccess
            | Self::PaymentFailed
            | Self::BookingReminder
            | Self::SecurityAlert
            | Self::SystemAlert => &[Sms, Email, InApp, Push],
            Self::RefundProcessed => &[Sms, Email, InApp],
            Self::SystemAnnouncement | Self::Promotion => &[Email, InApp, Push],
        }
    }

    /// Return the type as a snake_case string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OrderConfirmed => "order_confirmed",
            Self::OrderCancelled => "order_cancelled",
            Self::PaymentSuccess => "payment_success",
            Self::PaymentFailed => "payment_failed",
            Self::RefundProcessed => "refund_processed",
            Self::BookingReminder => "booking_reminder",
            Self::SystemAnnouncement => "system_announcement",
            Self::Promotion => "promotion",
            Self::SecurityAlert => "security_alert",
            Self::SystemAlert => "system_alert",
        }
    }
}

impl fmt::Display for NotificationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
