//! Notification creation, the in-app notification center, and
//! business-event triggers.

pub mod request;
pub mod service;
pub mod trigger;

pub use request::CreateNotificationRequest;
pub use service::NotificationService;
pub use trigger::{NotificationTrigger, TriggerReport};
