//! # tourhub-service
//!
//! The notification engine's business logic:
//!
//! - [`notification`]: create-and-send orchestration, the in-app read
//!   surface, and business-event triggers
//! - [`channel`]: the uniform sender contract and the SMS, email, push and
//!   in-app senders behind it
//! - [`delivery`]: claim, send, and resolve one record, with the retry policy
//! - [`security`]: content checks, the permission matrix, and rate limits
//! - [`template`]: `{{variable}}` rendering
//! - [`realtime`]: per-user broadcast used by the in-app channel

pub mod channel;
pub mod delivery;
pub mod notification;
pub mod realtime;
pub mod security;
pub mod template;

pub use delivery::{DeliveryOutcome, DeliveryProcessor, RetryPolicy};
pub use notification::{CreateNotificationRequest, NotificationService, NotificationTrigger};
pub use security::SecurityValidator;
