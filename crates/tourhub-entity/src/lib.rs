//! # tourhub-entity
//!
//! Domain entity models for the TourHub notification engine. Database
//! entities derive `sqlx::FromRow`; enums map onto PostgreSQL enum types
//! through `sqlx::Type`.

pub mod alert;
pub mod metrics;
pub mod notification;
pub mod recipient;
