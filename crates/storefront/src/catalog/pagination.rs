//! Pagination state derived from the filtered product set.

use serde::{Deserialize, Serialize};

/// Default page size for the product list.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

/// A pagination snapshot.
///
/// `total_items` and `total_pages` are derived values; the engine
/// recomputes the whole snapshot from the current filtered set on every
/// read. Invariants: `total_pages >= 1` (even for an empty set) and
/// `1 <= current_page <= total_pages`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// 1-indexed current page, already clamped.
    pub current_page: u32,
    /// Items per page, always positive.
    pub page_size: u32,
    /// Size of the filtered set.
    pub total_items: usize,
    /// Number of pages, at least 1.
    pub total_pages: u32,
}

impl Default for PaginationState {
    fn default() -> Self {
        Self {
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            total_items: 0,
            total_pages: 1,
        }
    }
}

impl PaginationState {
    /// Derive a snapshot from the filtered set size, clamping
    /// `requested_page` into `[1, total_pages]`.
    #[must_use]
    pub fn derive(total_items: usize, page_size: u32, requested_page: u32) -> Self {
        let total_pages = total_pages(total_items, page_size);
        Self {
            current_page: requested_page.clamp(1, total_pages),
            page_size,
            total_items,
            total_pages,
        }
    }

    /// Index of the first item on the current page.
    #[must_use]
    pub const fn start_index(&self) -> usize {
        (self.current_page as usize - 1) * self.page_size as usize
    }
}

/// `ceil(total_items / page_size)`, never below 1.
#[allow(clippy::cast_possible_truncation)]
fn total_pages(total_items: usize, page_size: u32) -> u32 {
    let size = page_size.max(1) as usize;
    let pages = total_items.div_ceil(size);
    pages.clamp(1, u32::MAX as usize) as u32
}
