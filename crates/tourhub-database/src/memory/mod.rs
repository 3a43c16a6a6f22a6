//! In-memory repository implementations.
//!
//! Used when no database URL is configured and by the test suites. Each
//! conditional update runs under the map's per-entry lock, so claims keep
//! their compare-and-set semantics across concurrent workers.

mod lookup;
mod notification;

pub use lookup::{InMemoryRecipientRepository, InMemoryTemplateRepository, InMemoryUserConfigRepository};
pub use notification::InMemoryNotificationRepository;
