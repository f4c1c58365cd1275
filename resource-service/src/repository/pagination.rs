//! Pagination types for repository queries
//!
//! Page indices are 1-based. The repository owns the arithmetic of slicing a
//! result set, and [`Pagination::new`] keeps the metadata consistent:
//! `page_count == ceil(total / page_size)`.
//!
//! # Example
//!
//! ```rust
//! use resource_service::repository::{PageQuery, Pagination};
//!
//! let query = PageQuery::new(3, 20);
//! assert_eq!(query.offset(), 40);
//!
//! let meta = Pagination::new(3, 20, 45);
//! assert_eq!(meta.page_count, 3);
//! ```

use serde::{Deserialize, Serialize};

/// The position of one page within a filtered result set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageQuery {
    /// Page number (1-indexed)
    pub page: u64,
    /// Number of rows per page, never zero
    pub page_size: u64,
}

impl PageQuery {
    /// Create page parameters
    ///
    /// Page 0 is read as page 1 and a zero page size as 1.
    #[must_use]
    pub const fn new(page: u64, page_size: u64) -> Self {
        Self {
            page: if page == 0 { 1 } else { page },
            page_size: if page_size == 0 { 1 } else { page_size },
        }
    }

    /// Rows to skip before this page starts
    #[must_use]
    pub const fn offset(&self) -> u64 {
        self.page.saturating_sub(1).saturating_mul(self.page_size)
    }
}

/// Pagination metadata returned alongside a page of rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    /// Total number of rows matching the filter set
    pub total: u64,
    /// Current page number (1-indexed)
    pub page: u64,
    /// Number of rows per page
    pub page_size: u64,
    /// Total number of pages
    pub page_count: u64,
}

impl Pagination {
    /// Build metadata for a page, computing `page_count` by ceiling division
    #[must_use]
    pub fn new(page: u64, page_size: u64, total: u64) -> Self {
        let query = PageQuery::new(page, page_size);
        Self {
            total,
            page: query.page,
            page_size: query.page_size,
            page_count: calculate_page_count(total, query.page_size),
        }
    }

    /// Metadata for a query over `total` rows
    #[must_use]
    pub fn for_query(query: PageQuery, total: u64) -> Self {
        Self::new(query.page, query.page_size, total)
    }
}

/// One page of rows plus its metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<M> {
    /// Rows on this page; empty when the page index is past the last page
    pub items: Vec<M>,
    /// Pagination metadata
    pub pagination: Pagination,
}

impl<M> Page<M> {
    /// Slice an already filtered result set into the requested page
    pub fn from_rows(rows: Vec<M>, query: PageQuery) -> Self {
        let total = rows.len() as u64;
        let offset = usize::try_from(query.offset()).unwrap_or(usize::MAX);
        let take = usize::try_from(query.page_size).unwrap_or(usize::MAX);
        let items = rows.into_iter().skip(offset).take(take).collect();
        Self {
            items,
            pagination: Pagination::for_query(query, total),
        }
    }
}

/// Calculate page count, rounding up
fn calculate_page_count(total: u64, page_size: u64) -> u64 {
    total.div_ceil(page_size.max(1))
}
