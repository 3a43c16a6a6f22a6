//! Core type definitions used across the TourHub workspace.

pub mod pagination;

pub use pagination::{PageRequest, PageResponse};
