//! Single-record delivery: claim, send, and record the outcome.

pub mod processor;
pub mod retry;

pub use processor::{DeliveryOutcome, DeliveryProcessor, LEASE_EXPIRED_MESSAGE};
pub use retry::RetryPolicy;
