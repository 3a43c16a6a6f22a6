//! Pagination types for list endpoints.

use serde::{Deserialize, Serialize};

/// Default page size.
const DEFAULT_PER_PAGE: u64 = 20;
/// Maximum page size.
const MAX_PER_PAGE: u64 = 100;

/// Request parameters for paginated queries.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PageRequest {
    /// Page number (1-based).
    #[serde(default = "default_page")]
    pub page: u64,
    /// Number of items per page.
    #[serde(default = "default_per_page")]
    pub per_page: u64,
}

impl PageRequest {
    /// Create a new page request, clamping out-of-range values.
    pub fn new(page: u64, per_page: u64) -> Self {
        Self {
            page: page.max(1),
            per_page: per_page.clamp(1, MAX_PER_PAGE),
        }
    }

    /// SQL `OFFSET` value.
    pub fn offset(&self) -> u64 {
        self.page.saturating_sub(1) * self.per_page
    }

    /// SQL `LIMIT` value.
    pub fn limit(&self) -> u64 {
        self.per_page
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: DEFAULT_PER_PAGE,
        }
    }
}

/// Paginated response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageResponse<T> {
    /// The items on this page.
    pub items: Vec<T>,
    /// Current page number (1-based).
    pub page: u64,
    /// Number of items per page.
    pub per_page: u64,
    /// Total number of items across all pages.
    pub total_items: u64,
    /// Total number of pages.
    pub total_pages: u64,
    /// Whether there is a next page.
    pub has_next: bool,
}

impl<T> PageResponse<T> {
    /// Create a new paginated response.
    pub fn new(items: Vec<T>, request: PageRequest, total_items: u64) -> Self {
        let per_page = request.per_page.max(1);
        let total_pages = total_items.div_ceil(per_page).max(1);
        Self {
            items,
            page: request.page,
            per_page,
            total_items,
            total_pages,
            has_next: request.page < total_pages,
        }
    }
}

fn default_page() -> u64 {
    1
}

fn default_per_page() -> u64 {
    DEFAULT_PER_PAGE
}
