//! Core traits defined in `tourhub-core` and implemented by other crates.

pub mod cache;

pub use cache::CacheProvider;
