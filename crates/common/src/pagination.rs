//! Per-request pagination.
//!
//! Page size travels with each request as a [`PageRequest`] value; there is
//! no process-wide page size to mutate.

use serde::Serialize;

/// Largest row offset the database accepts (a signed 64-bit bind).
const MAX_OFFSET: u64 = i64::MAX as u64;

/// A 1-based page request with an already-clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: u64,
    per_page: u64,
}

impl PageRequest {
    /// Build a page request.
    ///
    /// `page` of 0 is treated as 1; `per_page` falls back to `default_size`
    /// when absent or 0 and is capped at `max_size`. `page` is capped so
    /// that [`offset`](Self::offset) never exceeds `i64::MAX`.
    #[must_use]
    pub fn new(page: Option<u64>, per_page: Option<u64>, default_size: u64, max_size: u64) -> Self {
        let max_size = max_size.max(1);
        let per_page = per_page
            .filter(|n| *n > 0)
            .unwrap_or(default_size)
            .clamp(1, max_size);
        let max_page = MAX_OFFSET / per_page + 1;
        Self {
            page: page.unwrap_or(1).clamp(1, max_page),
            per_page,
        }
    }

    /// The first page with the given size.
    #[must_use]
    pub fn first(per_page: u64) -> Self {
        Self::new(None, Some(per_page), per_page, per_page)
    }

    /// 1-based page number.
    #[must_use]
    pub const fn page(&self) -> u64 {
        self.page
    }

    /// Items per page.
    #[must_use]
    pub const fn per_page(&self) -> u64 {
        self.per_page
    }

    /// Number of rows to skip.
    #[must_use]
    pub const fn offset(&self) -> u64 {
        (self.page - 1).saturating_mul(self.per_page)
    }
}

/// One page of results plus the totals needed to render navigation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// 1-based page number.
    pub page: u64,
    /// Items per page.
    pub per_page: u64,
    /// Total items across all pages.
    pub total: u64,
    /// Total number of pages (0 when there are no items).
    pub total_pages: u64,
}

impl<T> Page<T> {
    /// Assemble a page from a slice of results and the total count.
    #[must_use]
    pub fn new(items: Vec<T>, request: PageRequest, total: u64) -> Self {
        Self {
            items,
            page: request.page,
            per_page: request.per_page,
            total,
            total_pages: total.div_ceil(request.per_page),
        }
    }

    /// Convert every item, keeping the page metadata.
    #[must_use]
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            page: self.page,
            per_page: self.per_page,
            total: self.total,
            total_pages: self.total_pages,
        }
    }
}
