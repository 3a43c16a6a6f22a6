//! HTTP request handlers.

pub mod events;
pub mod health;
pub mod inbox;
pub mod monitor;
pub mod notification;
pub mod queue;
pub mod settings;
pub mod stream;
