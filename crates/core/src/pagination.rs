//! Page-number pagination for filtered listings.
//!
//! Listings are addressed with a 1-indexed `page` and an optional page size.
//! Without a page size no `LIMIT` is applied and the whole filtered result is
//! returned, so callers exposing that mode must be prepared for large pages.

use serde::Serialize;

use crate::error::CoreError;

/// Largest page size a client may request.
pub const MAX_PAGE_SIZE: i64 = 500;

/// A validated page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    /// 1-indexed page number.
    pub page: i64,
    /// Rows per page; `None` means unbounded.
    pub page_size: Option<i64>,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: None,
        }
    }
}

impl PageRequest {
    /// Validate raw query parameters.
    ///
    /// `page` defaults to 1 and must be at least 1. `page_size` must be in
    /// `1..=MAX_PAGE_SIZE` when given.
    pub fn new(page: Option<i64>, page_size: Option<i64>) -> Result<Self, CoreError> {
        let page = page.unwrap_or(1);
        if page < 1 {
            return Err(CoreError::Validation(format!(
                "page must be at least 1, got {page}"
            )));
        }
        if let Some(size) = page_size {
            if !(1..=MAX_PAGE_SIZE).contains(&size) {
                return Err(CoreError::Validation(format!(
                    "page size must be between 1 and {MAX_PAGE_SIZE}, got {size}"
                )));
            }
        }
        Ok(Self { page, page_size })
    }

    /// Number of rows skipped before this page: `(page - 1) * page_size`.
    ///
    /// Always 0 for unbounded requests, since the single page holds everything.
    pub fn offset(&self) -> i64 {
        match self.page_size {
            Some(size) => (self.page - 1).saturating_mul(size),
            None => 0,
        }
    }

    /// `LIMIT` / `OFFSET` pair, or `None` when no limit applies.
    pub fn limit_offset(&self) -> Option<(i64, i64)> {
        self.page_size.map(|size| (size, self.offset()))
    }
}

/// Whether rows exist beyond the page just returned.
pub fn has_more(request: &PageRequest, returned: usize, total: i64) -> bool {
    request.offset() + (returned as i64) < total
}

/// Paginated response body.
#[derive(Debug, Clone, Serialize)]
pub struct Page<T: Serialize> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: i64,
    pub page_size: Option<i64>,
    pub has_more: bool,
}

impl<T: Serialize> Page<T> {
    pub fn new(items: Vec<T>, total: i64, request: &PageRequest) -> Self {
        let has_more = has_more(request, items.len(), total);
        Self {
            items,
            total,
            page: request.page,
            page_size: request.page_size,
            has_more,
        }
    }
}
