//! Repository traits and their PostgreSQL implementations.
//!
//! Every consumer holds repositories as `Arc<dyn Trait>`, so the engine runs
//! unchanged against PostgreSQL or the in-memory stores in [`crate::memory`].

pub mod notification;
pub mod recipient;
pub mod template;
pub mod user_config;

use std::sync::Arc;

use sqlx::PgPool;

pub use notification::{NotificationRepository, PgNotificationRepository};
pub use recipient::{PgRecipientRepository, RecipientRepository};
pub use template::{PgTemplateRepository, TemplateRepository};
pub use user_config::{PgUserConfigRepository, UserConfigRepository};

use crate::memory::{
    InMemoryNotificationRepository, InMemoryRecipientRepository, InMemoryTemplateRepository,
    InMemoryUserConfigRepository,
};

/// The full set of repositories the engine needs.
#[derive(Clone)]
pub struct Repositories {
    pub notifications: Arc<dyn NotificationRepository>,
    pub user_configs: Arc<dyn UserConfigRepository>,
    pub templates: Arc<dyn TemplateRepository>,
    pub recipients: Arc<dyn RecipientRepository>,
}

impl Repositories {
    /// PostgreSQL-backed repositories sharing one pool.
    pub fn postgres(pool: PgPool) -> Self {
        Self {
            notifications: Arc::new(PgNotificationRepository::new(pool.clone())),
            user_configs: Arc::new(PgUserConfigRepository::new(pool.clone())),
            templates: Arc::new(PgTemplateRepository::new(pool.clone())),
            recipients: Arc::new(PgRecipientRepository::new(pool)),
        }
    }

    /// Process-local repositories with no persistence across restarts.
    pub fn in_memory() -> Self {
        Self {
            notifications: Arc::new(InMemoryNotificationRepository::new()),
            user_configs: Arc::new(InMemoryUserConfigRepository::new()),
            templates: Arc::new(InMemoryTemplateRepository::new()),
            recipients: Arc::new(InMemoryRecipientRepository::new()),
        }
    }
}
