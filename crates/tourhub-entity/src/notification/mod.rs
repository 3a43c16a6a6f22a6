//! Notification domain entities.

pub mod kind;
pub mod model;
pub mod template;
pub mod user_config;

pub use kind::{NotificationChannel, NotificationPriority, NotificationStatus, NotificationType};
pub use model::{NewNotification, Notification};
pub use template::NotificationTemplate;
pub use user_config::{DeliveryFrequency, NotificationUserConfig};
