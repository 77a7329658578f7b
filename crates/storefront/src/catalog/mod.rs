//! Product list engine: client-side filtering, sorting, and pagination.
//!
//! The full product set is bulk-loaded once; every filter or pagination
//! mutation afterwards is answered locally. Derived views (the filtered
//! list, the current page slice, pagination totals) are pure functions of
//! current state and are recomputed on every read - nothing derived is
//! stored.
//!
//! Overlapping `load_products` calls are not fenced; the last response to
//! land wins. Callers drive loads from UI events and should avoid issuing
//! a new load while one is in flight.

mod filters;
mod pagination;

pub use filters::{FilterState, SortBy};
pub use pagination::{DEFAULT_PAGE_SIZE, PaginationState};

use chrono::{DateTime, Duration, Utc};
use tracing::{instrument, warn};

use copperleaf_core::{CategoryId, Product};

use crate::api::ProductGateway;

/// How recent a product's `createdAt` must be to count as a new arrival.
const NEW_ARRIVAL_WINDOW_DAYS: i64 = 30;

/// User-visible message when the bulk load fails.
const LOAD_ERROR_MESSAGE: &str = "Failed to load products. Please check the API connection.";

/// Client-side product list state: the loaded set, filters, and pagination.
pub struct ProductListEngine<P> {
    gateway: P,
    products: Vec<Product>,
    filters: FilterState,
    current_page: u32,
    page_size: u32,
    is_loading: bool,
    error: Option<String>,
    now: fn() -> DateTime<Utc>,
}

impl<P: ProductGateway> ProductListEngine<P> {
    /// Create an engine with an empty product set and default filters.
    pub fn new(gateway: P) -> Self {
        Self::with_clock(gateway, Utc::now)
    }

    /// Create an engine with an injected clock. The clock anchors the
    /// new-arrivals window, which makes it testable.
    pub fn with_clock(gateway: P, now: fn() -> DateTime<Utc>) -> Self {
        Self {
            gateway,
            products: Vec::new(),
            filters: FilterState::default(),
            current_page: 1,
            page_size: DEFAULT_PAGE_SIZE,
            is_loading: false,
            error: None,
            now,
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Bulk-load the full product set, replacing any previous set.
    ///
    /// Failure is non-fatal: the set is emptied, a user-visible error
    /// message is recorded, and derivation keeps working over the empty
    /// set.
    #[instrument(skip(self))]
    pub async fn load_products(&mut self) {
        self.is_loading = true;
        self.error = None;

        match self.gateway.list_all().await {
            Ok(products) => {
                self.products = products;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load products");
                self.error = Some(LOAD_ERROR_MESSAGE.to_string());
                self.products.clear();
            }
        }

        self.is_loading = false;
    }

    // =========================================================================
    // Filter Mutations (each resets to page 1)
    // =========================================================================

    /// Update the search term.
    pub fn set_search_term(&mut self, term: impl Into<String>) {
        self.filters.search_term = term.into();
        self.reset_pagination();
    }

    /// Update the category filter; `None` clears it.
    pub fn set_category_filter(&mut self, category_id: Option<CategoryId>) {
        self.filters.category_id = category_id;
        self.reset_pagination();
    }

    /// Update the sort order for the default branch.
    pub fn set_sort_by(&mut self, sort_by: SortBy) {
        self.filters.sort_by = sort_by;
        self.reset_pagination();
    }

    /// Toggle the best-sellers filter. Mutually exclusive with new
    /// arrivals: turning this on forces the other off.
    pub fn toggle_best_sellers(&mut self) {
        self.filters.best_sellers_only = !self.filters.best_sellers_only;
        self.filters.new_arrivals_only = false;
        self.reset_pagination();
    }

    /// Toggle the new-arrivals filter. Mutually exclusive with best
    /// sellers: turning this on forces the other off.
    pub fn toggle_new_arrivals(&mut self) {
        self.filters.new_arrivals_only = !self.filters.new_arrivals_only;
        self.filters.best_sellers_only = false;
        self.reset_pagination();
    }

    /// Reset all filters to their defaults.
    pub fn clear_filters(&mut self) {
        self.filters = FilterState::default();
        self.reset_pagination();
    }

    // =========================================================================
    // Pagination Mutations
    // =========================================================================

    /// Jump to a page; a no-op when `page` is outside `[1, total_pages]`.
    pub fn go_to_page(&mut self, page: u32) {
        let total_pages = self.pagination().total_pages;
        if (1..=total_pages).contains(&page) {
            self.current_page = page;
        }
    }

    /// Advance one page, bounded by the last page.
    pub fn next_page(&mut self) {
        self.go_to_page(self.pagination().current_page + 1);
    }

    /// Step back one page, bounded by the first page.
    pub fn previous_page(&mut self) {
        let current = self.pagination().current_page;
        if current > 1 {
            self.go_to_page(current - 1);
        }
    }

    /// Change the page size and reset to page 1. A zero size is ignored.
    pub fn set_page_size(&mut self, size: u32) {
        if size == 0 {
            warn!("Ignoring zero page size");
            return;
        }
        self.page_size = size;
        self.reset_pagination();
    }

    fn reset_pagination(&mut self) {
        self.current_page = 1;
    }

    // =========================================================================
    // Derived Views
    // =========================================================================

    /// Current filter state.
    #[must_use]
    pub const fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Current pagination snapshot, derived from the filtered set and
    /// clamped so that `1 <= current_page <= total_pages`.
    #[must_use]
    pub fn pagination(&self) -> PaginationState {
        PaginationState::derive(self.derive().len(), self.page_size, self.current_page)
    }

    /// The filtered and sorted product list (all pages).
    #[must_use]
    pub fn filtered_products(&self) -> Vec<&Product> {
        self.derive()
    }

    /// The current page of the filtered and sorted list.
    #[must_use]
    pub fn page(&self) -> Vec<&Product> {
        let filtered = self.derive();
        let pagination =
            PaginationState::derive(filtered.len(), self.page_size, self.current_page);
        filtered
            .into_iter()
            .skip(pagination.start_index())
            .take(pagination.page_size as usize)
            .collect()
    }

    /// The user-visible load error, if the last load failed.
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Whether a bulk load is in flight.
    #[must_use]
    pub const fn is_loading(&self) -> bool {
        self.is_loading
    }

    /// Apply filters and ordering to the full set.
    ///
    /// Order of application: search, category, then exactly one of the
    /// special toggles (which impose their own ordering) or the `sort_by`
    /// ordering.
    fn derive(&self) -> Vec<&Product> {
        let mut result: Vec<&Product> = self.products.iter().collect();

        if let Some(needle) = self.filters.search_needle() {
            result.retain(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.description.to_lowercase().contains(&needle)
            });
        }

        if let Some(category_id) = &self.filters.category_id {
            result.retain(|p| p.category_id() == Some(category_id));
        }

        if self.filters.best_sellers_only {
            result.retain(|p| p.sold_count > 0);
            result.sort_by(|a, b| b.sold_count.cmp(&a.sold_count));
        } else if self.filters.new_arrivals_only {
            let cutoff = (self.now)() - Duration::days(NEW_ARRIVAL_WINDOW_DAYS);
            result.retain(|p| p.created_at_or_epoch() >= cutoff);
            result.sort_by(|a, b| b.created_at_or_epoch().cmp(&a.created_at_or_epoch()));
        } else {
            match self.filters.sort_by {
                SortBy::Newest => {
                    result.sort_by(|a, b| b.created_at_or_epoch().cmp(&a.created_at_or_epoch()));
                }
                SortBy::PriceAsc => result.sort_by(|a, b| a.price.cmp(&b.price)),
                SortBy::PriceDesc => result.sort_by(|a, b| b.price.cmp(&a.price)),
            }
        }

        result
    }
}
