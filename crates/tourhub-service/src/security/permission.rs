//! Which channels each notification type may use.

use tracing::debug;
use uuid::Uuid;

use tourhub_entity::notification::{NotificationChannel, NotificationType};

/// Check the fixed type/channel matrix.
///
/// The matrix is the same for every user; `user_id` is carried for logging.
pub fn is_allowed(
    user_id: Uuid,
    notification_type: NotificationType,
    channel: NotificationChannel,
) -> bool {
    let allowed = notification_type.allowed_channels().contains(&channel);
    if !allowed {
        debug!(
            user_id = %user_id,
            notification_type = %notification_type,
            channel = %channel,
            "Channel not permitted for notification type"
        );
    }
    allowed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matrix_rejects_forbidden_pairs() {
        let user = Uuid::new_v4();
        assert!(!is_allowed(user, NotificationType::Promotion, NotificationChannel::Sms));
        assert!(!is_allowed(
            user,
            NotificationType::SystemAnnouncement,
            NotificationChannel::Sms
        ));
        assert!(!is_allowed(
            user,
            NotificationType::RefundProcessed,
            NotificationChannel::Push
        ));
    }

    #[test]
    fn test_matrix_allows_transactional_everywhere() {
        let user = Uuid::new_v4();
        for channel in NotificationChannel::ALL {
            assert!(is_allowed(user, NotificationType::OrderConfirmed, channel));
            assert!(is_allowed(user, NotificationType::SecurityAlert, channel));
        }
        assert!(is_allowed(user, NotificationType::Promotion, NotificationChannel::InApp));
    }
}
