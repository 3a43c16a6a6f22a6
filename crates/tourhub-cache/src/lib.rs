//! # tourhub-cache
//!
//! Cache provider implementations for TourHub. Supports two modes:
//!
//! - **memory**: in-process cache using [moka](https://crates.io/crates/moka)
//!   with atomic counters kept beside it
//! - **redis**: Redis-backed cache using the [redis](https://crates.io/crates/redis) crate,
//!   required when more than one engine instance shares rate-limit quotas
//!
//! The provider is selected at runtime based on configuration.

pub mod keys;
#[cfg(feature = "memory")]
pub mod memory;
pub mod provider;
#[cfg(feature = "redis-backend")]
pub mod redis;

pub use provider::CacheManager;
