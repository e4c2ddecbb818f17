//! Pagination bookkeeping for listing views.

use crate::api::Page;

/// Page sizes offered by the size switcher.
pub const PAGE_SIZES: [u32; 4] = [10, 20, 50, 100];

/// Largest page size the backend accepts.
pub const MAX_PAGE_SIZE: u32 = 200;

/// Pagination metadata of the page currently on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub page_size: u32,
    pub total: u64,
    pub page_count: u32,
}

impl Pagination {
    /// Empty first page.
    pub fn new(page_size: u32) -> Self {
        Self {
            page: 1,
            page_size: page_size.clamp(1, MAX_PAGE_SIZE),
            total: 0,
            page_count: 1,
        }
    }

    /// Take metadata from a served page. The backend may clamp `page`.
    pub fn from_page<T>(page: &Page<T>) -> Self {
        let page_size = page.page_size.max(1);
        let page_count =
            page.all_page.unwrap_or_else(|| page_count(page.total, page_size)).max(1);
        Self {
            page: page.page.max(1),
            page_size,
            total: page.total,
            page_count,
        }
    }

    /// One-based row number of the `index`-th row on this page.
    pub fn row_number(&self, index: usize) -> u64 {
        u64::from(self.page.saturating_sub(1)) * u64::from(self.page_size) + index as u64 + 1
    }

    pub fn has_next(&self) -> bool {
        self.page < self.page_count
    }

    pub fn has_prev(&self) -> bool {
        self.page > 1
    }
}

/// Number of pages needed for `total` rows; never less than one.
pub fn page_count(total: u64, page_size: u32) -> u32 {
    let size = u64::from(page_size.max(1));
    let pages = total.div_ceil(size).max(1);
    u32::try_from(pages).unwrap_or(u32::MAX)
}

/// The size after `current` in [`PAGE_SIZES`], wrapping around.
pub fn next_page_size(current: u32) -> u32 {
    match PAGE_SIZES.iter().position(|&s| s == current) {
        Some(i) => PAGE_SIZES[(i + 1) % PAGE_SIZES.len()],
        None => PAGE_SIZES[0],
    }
}
