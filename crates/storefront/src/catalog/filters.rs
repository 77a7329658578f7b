//! Filter state for the product list.

use serde::{Deserialize, Serialize};

use copperleaf_core::CategoryId;

/// Sort order for the default (no special toggle) branch.
///
/// When the best-sellers or new-arrivals toggle is active, that toggle's
/// own ordering wins and this value is ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SortBy {
    /// Newest first, by creation timestamp (missing timestamps sort last).
    #[default]
    #[serde(rename = "newest")]
    Newest,
    /// Cheapest first.
    #[serde(rename = "price-asc")]
    PriceAsc,
    /// Most expensive first.
    #[serde(rename = "price-desc")]
    PriceDesc,
}

/// Current filter state.
///
/// Invariant: at most one of `best_sellers_only` and `new_arrivals_only` is
/// true; [`crate::catalog::ProductListEngine`]'s toggles enforce it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterState {
    /// Free-text search; trimmed before matching.
    pub search_term: String,
    /// Category filter; `None` means no filter.
    pub category_id: Option<CategoryId>,
    /// Only products that have ever sold, ranked by units sold.
    pub best_sellers_only: bool,
    /// Only products created within the arrival window, newest first.
    pub new_arrivals_only: bool,
    /// Ordering for the default branch.
    pub sort_by: SortBy,
}

impl FilterState {
    /// The trimmed search term, or `None` when blank.
    #[must_use]
    pub fn search_needle(&self) -> Option<String> {
        let trimmed = self.search_term.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_lowercase())
        }
    }
}
