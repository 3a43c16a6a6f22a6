//! # tourhub-database
//!
//! Persistence layer for the notification engine: the PostgreSQL pool,
//! embedded migrations, the repository traits every other crate depends
//! on, and two implementations of them (sqlx/PostgreSQL and in-memory).

pub mod connection;
pub mod memory;
pub mod repositories;

pub use connection::DatabasePool;
pub use repositories::{
    NotificationRepository, RecipientRepository, Repositories, TemplateRepository,
    UserConfigRepository,
};
