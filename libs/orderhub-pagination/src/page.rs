//! Page values and their derived metadata.

use serde::Serialize;
use thiserror::Error;

/// Invalid pagination input supplied by a caller.
///
/// Out-of-range values are rejected, never clamped.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginationError {
    #[error("page number must be >= 1, got {0}")]
    InvalidPageNumber(i64),

    #[error("page size must be >= 1, got {0}")]
    InvalidPageSize(i64),
}

/// A validated `(page_number, page_size)` pair. Both are 1-based and >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page_number: u64,
    page_size: u64,
}

impl PageRequest {
    /// Validate raw caller input into a page request.
    ///
    /// # Errors
    ///
    /// Returns [`PaginationError`] when either value is zero or negative.
    pub fn new(page_number: i64, page_size: i64) -> Result<Self, PaginationError> {
        if page_number < 1 {
            return Err(PaginationError::InvalidPageNumber(page_number));
        }
        if page_size < 1 {
            return Err(PaginationError::InvalidPageSize(page_size));
        }
        #[allow(clippy::cast_sign_loss)] // both checked >= 1 above
        Ok(Self {
            page_number: page_number as u64,
            page_size: page_size as u64,
        })
    }

    #[must_use]
    pub fn page_number(&self) -> u64 {
        self.page_number
    }

    #[must_use]
    pub fn page_size(&self) -> u64 {
        self.page_size
    }

    /// Start of the half-open window `[offset, offset + page_size)`.
    #[must_use]
    pub fn offset(&self) -> u64 {
        (self.page_number - 1).saturating_mul(self.page_size)
    }
}

/// Derived pagination metadata, serialized in camelCase for the
/// out-of-band response header.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub current_page: u64,
    pub page_size: u64,
    pub total_count: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl PageMeta {
    /// Derive metadata from a request and the total matching row count.
    #[must_use]
    pub fn derive(request: &PageRequest, total_count: u64) -> Self {
        let total_pages = total_count.div_ceil(request.page_size());
        let current_page = request.page_number();
        Self {
            current_page,
            page_size: request.page_size(),
            total_count,
            total_pages,
            has_previous: current_page > 1,
            has_next: current_page < total_pages,
        }
    }
}

/// An immutable window over an ordered result set plus its metadata.
///
/// Constructed once by the page builder and never appended to; the items
/// and the metadata therefore cannot drift apart after construction.
#[derive(Debug, Clone)]
pub struct Page<T> {
    items: Vec<T>,
    meta: PageMeta,
}

impl<T> Page<T> {
    pub(crate) fn new(items: Vec<T>, meta: PageMeta) -> Self {
        debug_assert!(items.len() as u64 <= meta.page_size);
        Self { items, meta }
    }

    #[must_use]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[must_use]
    pub fn meta(&self) -> &PageMeta {
        &self.meta
    }

    #[must_use]
    pub fn into_parts(self) -> (Vec<T>, PageMeta) {
        (self.items, self.meta)
    }
}
