//! Cart engine: one view, two backing stores.
//!
//! The engine operates in one of two modes, decided per operation by the
//! injected [`SessionProbe`]:
//!
//! - **Guest** - lines live in the local key-value store; mutations commit
//!   locally first (optimistic, local state is the source of truth)
//! - **Authenticated** - the server cart is authoritative; every mutation
//!   is followed by a full `load_cart` resync, and local state only
//!   changes when that resync succeeds (fail-closed)
//!
//! A login triggers [`CartEngine::merge_carts_after_login`], a best-effort
//! sequential transfer of the guest lines to the server. There is no
//! atomicity: a line whose server add fails is logged and skipped, and the
//! guest store is cleared unconditionally afterwards.
//!
//! Observers always see whole-collection replacement of the line list,
//! never partial in-place splicing.

mod guest;

pub use guest::GuestCartStore;

use futures::future::join_all;
use tracing::{instrument, warn};

use copperleaf_core::{CartLine, ProductId, StoredCartItem};

use crate::api::{ApiError, CartGateway, ProductGateway};
use crate::session::SessionProbe;
use crate::storage::KeyValueStore;

/// Which backing store the cart is currently running against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartMode {
    /// Unauthenticated; lines persisted locally.
    Guest,
    /// A login-triggered merge is in flight.
    Merging,
    /// Signed in; the server cart is authoritative.
    Authenticated,
}

/// The cart engine.
///
/// Holds the current line-item view and routes every operation to the
/// guest or server path based on the session probe.
pub struct CartEngine<C, P, S, K> {
    carts: C,
    products: P,
    session: S,
    guest: GuestCartStore<K>,
    items: Vec<CartLine>,
    merging: bool,
}

impl<C, P, S, K> CartEngine<C, P, S, K>
where
    C: CartGateway,
    P: ProductGateway,
    S: SessionProbe,
    K: KeyValueStore,
{
    /// Create an engine with an empty in-memory view.
    ///
    /// Call [`Self::load_cart`] afterwards to populate it.
    pub const fn new(carts: C, products: P, session: S, store: K) -> Self {
        Self {
            carts,
            products,
            session,
            guest: GuestCartStore::new(store),
            items: Vec::new(),
            merging: false,
        }
    }

    /// The current line-item view.
    #[must_use]
    pub fn items(&self) -> &[CartLine] {
        &self.items
    }

    /// Number of distinct lines (not units) in the cart.
    #[must_use]
    pub const fn count(&self) -> usize {
        self.items.len()
    }

    /// Current mode, derived from the session probe and the merge flag.
    pub fn mode(&self) -> CartMode {
        if self.merging {
            CartMode::Merging
        } else if self.session.is_authenticated() {
            CartMode::Authenticated
        } else {
            CartMode::Guest
        }
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Reload the cart view from the authoritative store.
    ///
    /// Never fails: every error path ends in a stable view (empty for the
    /// server cart, snapshot-less lines for a guest cart whose product
    /// hydration failed).
    #[instrument(skip(self))]
    pub async fn load_cart(&mut self) {
        if self.session.is_authenticated() {
            self.load_server_cart().await;
        } else {
            self.load_guest_cart().await;
        }
    }

    async fn load_server_cart(&mut self) {
        match self.carts.get().await {
            Ok(snapshot) => {
                // Server lines may carry the populated product document in
                // the productId field; split it into id + snapshot.
                self.items = snapshot
                    .lines
                    .into_iter()
                    .map(|line| {
                        let (product_id, product) = line.product.into_parts();
                        CartLine {
                            product_id,
                            quantity: line.quantity,
                            product,
                        }
                    })
                    .collect();
            }
            Err(e) => {
                warn!(error = %e, "Failed to load server cart, showing empty cart");
                self.items = Vec::new();
            }
        }
    }

    async fn load_guest_cart(&mut self) {
        let stored = self.guest.load();
        if stored.is_empty() {
            self.items = Vec::new();
            return;
        }

        let fetches = stored
            .iter()
            .map(|item| self.products.get_by_id(&item.product_id));
        let results: Result<Vec<_>, ApiError> = join_all(fetches).await.into_iter().collect();

        match results {
            Ok(products) => {
                self.items = products
                    .into_iter()
                    .zip(stored)
                    .map(|(product, item)| CartLine {
                        product_id: item.product_id,
                        quantity: item.quantity,
                        product: Some(product),
                    })
                    .collect();
            }
            Err(e) => {
                warn!(error = %e, "Guest cart hydration failed, keeping bare lines");
                self.items = stored.into_iter().map(CartLine::from).collect();
            }
        }
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a quantity of a product.
    ///
    /// Guest: find-or-append locally (same product increments the existing
    /// line), persist, then reload to hydrate. Authenticated: server
    /// add-or-increment, then resync. Calls are at-least-once - repeating
    /// an add increments further, there is no client-side dedup.
    ///
    /// # Errors
    ///
    /// Returns the server error in authenticated mode; the view is left
    /// unchanged in that case. The guest path never fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        if self.session.is_authenticated() {
            self.carts.add(product_id, quantity).await?;
            self.load_cart().await;
            return Ok(());
        }

        let mut stored = self.guest.load();
        if let Some(line) = stored.iter_mut().find(|i| &i.product_id == product_id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            stored.push(StoredCartItem::new(product_id.clone(), quantity));
        }
        self.persist_guest(&stored);
        self.load_cart().await;
        Ok(())
    }

    /// Remove a product's line entirely.
    ///
    /// The guest path is fully synchronous: the persisted cart is
    /// re-read, filtered, and written back (so a stale or never-loaded
    /// view cannot clobber it), and no snapshot refresh is needed for a
    /// removal.
    ///
    /// # Errors
    ///
    /// Returns the server error in authenticated mode, leaving the view
    /// unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove_from_cart(&mut self, product_id: &ProductId) -> Result<(), ApiError> {
        if self.session.is_authenticated() {
            self.carts.remove(product_id).await?;
            self.load_cart().await;
            return Ok(());
        }

        let mut stored = self.guest.load();
        stored.retain(|item| &item.product_id != product_id);
        self.persist_guest(&stored);
        self.items.retain(|line| &line.product_id != product_id);
        Ok(())
    }

    /// Set the quantity of a product's line. A guest line that does not
    /// exist is left alone.
    ///
    /// # Errors
    ///
    /// Returns the server error in authenticated mode, leaving the view
    /// unchanged.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update_quantity(
        &mut self,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<(), ApiError> {
        if self.session.is_authenticated() {
            self.carts.update(product_id, quantity).await?;
            self.load_cart().await;
            return Ok(());
        }

        let mut stored = self.guest.load();
        if let Some(item) = stored.iter_mut().find(|i| &i.product_id == product_id) {
            item.quantity = quantity;
            self.persist_guest(&stored);
        }
        if let Some(line) = self.items.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = quantity;
        }
        Ok(())
    }

    // =========================================================================
    // Session Transitions
    // =========================================================================

    /// Transfer the guest cart to the server cart after a login.
    ///
    /// Best-effort and sequential: each stored line is added via the
    /// server's add-or-increment call, a failing line is logged and
    /// skipped, and the guest store is cleared unconditionally once all
    /// adds have been issued. Ends with a full reload of the (now
    /// authoritative) server cart.
    #[instrument(skip(self))]
    pub async fn merge_carts_after_login(&mut self) {
        let stored = self.guest.load();
        if !stored.is_empty() {
            self.merging = true;
            for item in &stored {
                if let Err(e) = self.carts.add(&item.product_id, item.quantity).await {
                    warn!(
                        error = %e,
                        product_id = %item.product_id,
                        "Guest line failed to merge, skipping it"
                    );
                }
            }
            if let Err(e) = self.guest.clear() {
                warn!(error = %e, "Failed to clear guest cart after merge");
            }
            self.merging = false;
        }
        self.load_cart().await;
    }

    /// Handle a logout: the server cart is not retained locally, and a
    /// fresh guest cart starts empty.
    pub fn logout(&mut self) {
        self.merging = false;
        self.items = Vec::new();
    }

    fn persist_guest(&self, stored: &[StoredCartItem]) {
        // Local state is the source of truth for guests; a persistence
        // failure must not lose the in-memory mutation.
        if let Err(e) = self.guest.save(stored) {
            warn!(error = %e, "Failed to persist guest cart");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use copperleaf_core::{Product, ProductRef};

    use crate::api::{CartSnapshot, RawCartLine};
    use crate::session::SharedSession;
    use crate::storage::{MemoryStore, keys};

    fn product(id: &str, name: &str) -> Product {
        Product {
            id: ProductId::new(id),
            name: name.to_string(),
            description: String::new(),
            price: "10.00".parse().unwrap(),
            category: None,
            stock: 5,
            sold_count: 0,
            created_at: None,
            image: None,
        }
    }

    /// Server cart fake: an upsert map plus failure switches.
    #[derive(Default)]
    struct FakeCartServer {
        lines: Mutex<Vec<(ProductId, u32)>>,
        expansions: HashMap<ProductId, Product>,
        fail_add_for: Option<ProductId>,
        fail_mutations: bool,
        malformed_get: bool,
    }

    impl FakeCartServer {
        fn server_lines(&self) -> Vec<(ProductId, u32)> {
            self.lines.lock().unwrap().clone()
        }
    }

    impl CartGateway for FakeCartServer {
        async fn get(&self) -> Result<CartSnapshot, ApiError> {
            if self.malformed_get {
                return Err(ApiError::ShapeMismatch(
                    "cart response has no `items` array".to_string(),
                ));
            }
            let lines = self
                .server_lines()
                .into_iter()
                .map(|(id, quantity)| RawCartLine {
                    product: self.expansions.get(&id).map_or_else(
                        || ProductRef::Id(id.clone()),
                        |p| ProductRef::Expanded(Box::new(p.clone())),
                    ),
                    quantity,
                })
                .collect();
            Ok(CartSnapshot { lines })
        }

        async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
            if self.fail_mutations || self.fail_add_for.as_ref() == Some(product_id) {
                return Err(ApiError::Status {
                    status: 500,
                    body: "add failed".to_string(),
                });
            }
            let mut lines = self.lines.lock().unwrap();
            if let Some(line) = lines.iter_mut().find(|(id, _)| id == product_id) {
                line.1 += quantity;
            } else {
                lines.push((product_id.clone(), quantity));
            }
            Ok(())
        }

        async fn remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
            if self.fail_mutations {
                return Err(ApiError::Status {
                    status: 500,
                    body: "remove failed".to_string(),
                });
            }
            self.lines.lock().unwrap().retain(|(id, _)| id != product_id);
            Ok(())
        }

        async fn update(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
            if self.fail_mutations {
                return Err(ApiError::Status {
                    status: 500,
                    body: "update failed".to_string(),
                });
            }
            let mut lines = self.lines.lock().unwrap();
            if let Some(line) = lines.iter_mut().find(|(id, _)| id == product_id) {
                line.1 = quantity;
            }
            Ok(())
        }
    }

    /// Product lookup fake for hydration.
    #[derive(Default)]
    struct FakeProducts {
        by_id: HashMap<ProductId, Product>,
        fail: bool,
    }

    impl FakeProducts {
        fn with(products: &[Product]) -> Self {
            Self {
                by_id: products.iter().map(|p| (p.id.clone(), p.clone())).collect(),
                fail: false,
            }
        }
    }

    impl ProductGateway for FakeProducts {
        async fn list_all(&self) -> Result<Vec<Product>, ApiError> {
            Ok(self.by_id.values().cloned().collect())
        }

        async fn get_by_id(&self, id: &ProductId) -> Result<Product, ApiError> {
            if self.fail {
                return Err(ApiError::Status {
                    status: 502,
                    body: "down".to_string(),
                });
            }
            self.by_id
                .get(id)
                .cloned()
                .ok_or_else(|| ApiError::NotFound(id.to_string()))
        }

        async fn best_sellers(&self) -> Result<Vec<Product>, ApiError> {
            Ok(Vec::new())
        }

        async fn new_arrivals(&self) -> Result<Vec<Product>, ApiError> {
            Ok(Vec::new())
        }
    }

    type TestEngine<'a> =
        CartEngine<&'a FakeCartServer, &'a FakeProducts, SharedSession, &'a MemoryStore>;

    fn engine<'a>(
        server: &'a FakeCartServer,
        products: &'a FakeProducts,
        session: &SharedSession,
        store: &'a MemoryStore,
    ) -> TestEngine<'a> {
        CartEngine::new(server, products, session.clone(), store)
    }

    fn seed_guest_cart(store: &MemoryStore, items: &[(&str, u32)]) {
        let stored: Vec<StoredCartItem> = items
            .iter()
            .map(|(id, q)| StoredCartItem::new(ProductId::new(*id), *q))
            .collect();
        GuestCartStore::new(store).save(&stored).unwrap();
    }

    #[tokio::test]
    async fn test_guest_add_increments_existing_line() {
        let server = FakeCartServer::default();
        let products = FakeProducts::with(&[product("p1", "Desk")]);
        let session = SharedSession::new();
        let store = MemoryStore::new();
        seed_guest_cart(&store, &[("p1", 2)]);

        let mut cart = engine(&server, &products, &session, &store);
        cart.add_to_cart(&ProductId::new("p1"), 3).await.unwrap();

        // One line, merged quantity, hydrated snapshot
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.items()[0].quantity, 5);
        assert_eq!(
            cart.items()[0].product.as_ref().unwrap().name,
            "Desk"
        );

        let persisted = GuestCartStore::new(&store).load();
        assert_eq!(persisted, vec![StoredCartItem::new(ProductId::new("p1"), 5)]);
    }

    #[tokio::test]
    async fn test_guest_add_appends_new_line() {
        let server = FakeCartServer::default();
        let products = FakeProducts::with(&[product("p1", "Desk"), product("p2", "Lamp")]);
        let session = SharedSession::new();
        let store = MemoryStore::new();

        let mut cart = engine(&server, &products, &session, &store);
        cart.add_to_cart(&ProductId::new("p1"), 1).await.unwrap();
        cart.add_to_cart(&ProductId::new("p2"), 2).await.unwrap();

        assert_eq!(cart.count(), 2);
        assert_eq!(cart.mode(), CartMode::Guest);
    }

    #[tokio::test]
    async fn test_guest_hydration_failure_keeps_bare_lines() {
        let server = FakeCartServer::default();
        let products = FakeProducts {
            fail: true,
            ..FakeProducts::default()
        };
        let session = SharedSession::new();
        let store = MemoryStore::new();
        seed_guest_cart(&store, &[("p1", 2), ("p2", 1)]);

        let mut cart = engine(&server, &products, &session, &store);
        cart.load_cart().await;

        assert_eq!(cart.count(), 2);
        assert!(cart.items().iter().all(|line| line.product.is_none()));
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_guest_remove_is_synchronous_and_persists() {
        let server = FakeCartServer::default();
        let products = FakeProducts::with(&[product("p1", "Desk"), product("p2", "Lamp")]);
        let session = SharedSession::new();
        let store = MemoryStore::new();
        seed_guest_cart(&store, &[("p1", 2), ("p2", 1)]);

        let mut cart = engine(&server, &products, &session, &store);
        cart.load_cart().await;
        cart.remove_from_cart(&ProductId::new("p1")).await.unwrap();

        assert_eq!(cart.count(), 1);
        assert_eq!(cart.items()[0].product_id, ProductId::new("p2"));

        let persisted = GuestCartStore::new(&store).load();
        assert_eq!(persisted, vec![StoredCartItem::new(ProductId::new("p2"), 1)]);
    }

    #[tokio::test]
    async fn test_guest_update_quantity_in_place() {
        let server = FakeCartServer::default();
        let products = FakeProducts::with(&[product("p1", "Desk")]);
        let session = SharedSession::new();
        let store = MemoryStore::new();
        seed_guest_cart(&store, &[("p1", 2)]);

        let mut cart = engine(&server, &products, &session, &store);
        cart.load_cart().await;
        cart.update_quantity(&ProductId::new("p1"), 7).await.unwrap();

        assert_eq!(cart.items()[0].quantity, 7);
        let persisted = GuestCartStore::new(&store).load();
        assert_eq!(persisted[0].quantity, 7);

        // Updating a missing line is a no-op
        cart.update_quantity(&ProductId::new("ghost"), 1).await.unwrap();
        assert_eq!(cart.count(), 1);
    }

    #[tokio::test]
    async fn test_guest_mutations_before_load_do_not_clobber_store() {
        let server = FakeCartServer::default();
        let products = FakeProducts::with(&[product("p1", "Desk"), product("p2", "Lamp")]);
        let session = SharedSession::new();
        let store = MemoryStore::new();
        seed_guest_cart(&store, &[("p1", 2), ("p2", 1)]);

        // No load_cart: the in-memory view is still empty
        let mut cart = engine(&server, &products, &session, &store);
        cart.remove_from_cart(&ProductId::new("p1")).await.unwrap();

        let persisted = GuestCartStore::new(&store).load();
        assert_eq!(persisted, vec![StoredCartItem::new(ProductId::new("p2"), 1)]);

        cart.update_quantity(&ProductId::new("p2"), 4).await.unwrap();
        let persisted = GuestCartStore::new(&store).load();
        assert_eq!(persisted, vec![StoredCartItem::new(ProductId::new("p2"), 4)]);
    }

    #[tokio::test]
    async fn test_server_cart_normalizes_populated_product_refs() {
        let desk = product("p1", "Desk");
        let server = FakeCartServer {
            lines: Mutex::new(vec![(ProductId::new("p1"), 2)]),
            expansions: HashMap::from([(ProductId::new("p1"), desk)]),
            ..FakeCartServer::default()
        };
        let products = FakeProducts::default();
        let session = SharedSession::new();
        session.set_authenticated(true);
        let store = MemoryStore::new();

        let mut cart = engine(&server, &products, &session, &store);
        cart.load_cart().await;

        assert_eq!(cart.mode(), CartMode::Authenticated);
        assert_eq!(cart.items()[0].product_id, ProductId::new("p1"));
        assert_eq!(cart.items()[0].product.as_ref().unwrap().name, "Desk");
    }

    #[tokio::test]
    async fn test_malformed_server_cart_falls_back_to_empty() {
        let server = FakeCartServer {
            malformed_get: true,
            ..FakeCartServer::default()
        };
        let products = FakeProducts::default();
        let session = SharedSession::new();
        session.set_authenticated(true);
        let store = MemoryStore::new();

        let mut cart = engine(&server, &products, &session, &store);
        cart.load_cart().await;

        assert!(cart.items().is_empty());
    }

    #[tokio::test]
    async fn test_authenticated_mutation_failure_leaves_view_unchanged() {
        let server = FakeCartServer {
            lines: Mutex::new(vec![(ProductId::new("p1"), 2)]),
            fail_mutations: true,
            ..FakeCartServer::default()
        };
        let products = FakeProducts::default();
        let session = SharedSession::new();
        session.set_authenticated(true);
        let store = MemoryStore::new();

        let mut cart = engine(&server, &products, &session, &store);
        cart.load_cart().await;
        let before = cart.items().to_vec();

        let err = cart.add_to_cart(&ProductId::new("p2"), 1).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { status: 500, .. }));
        assert_eq!(cart.items(), before.as_slice());

        let err = cart.remove_from_cart(&ProductId::new("p1")).await.unwrap_err();
        assert!(matches!(err, ApiError::Status { .. }));
        assert_eq!(cart.items(), before.as_slice());
    }

    #[tokio::test]
    async fn test_authenticated_add_is_at_least_once() {
        let server = FakeCartServer::default();
        let products = FakeProducts::default();
        let session = SharedSession::new();
        session.set_authenticated(true);
        let store = MemoryStore::new();

        let mut cart = engine(&server, &products, &session, &store);
        cart.add_to_cart(&ProductId::new("p1"), 1).await.unwrap();
        cart.add_to_cart(&ProductId::new("p1"), 1).await.unwrap();

        // No client-side dedup: the server increments twice
        assert_eq!(server.server_lines(), vec![(ProductId::new("p1"), 2)]);
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[tokio::test]
    async fn test_merge_transfers_guest_lines_and_clears_store() {
        let server = FakeCartServer::default();
        let products = FakeProducts::default();
        let session = SharedSession::new();
        let store = MemoryStore::new();
        seed_guest_cart(&store, &[("p1", 2), ("p2", 1)]);

        let mut cart = engine(&server, &products, &session, &store);
        session.set_authenticated(true);
        cart.merge_carts_after_login().await;

        assert_eq!(cart.mode(), CartMode::Authenticated);
        assert_eq!(
            server.server_lines(),
            vec![(ProductId::new("p1"), 2), (ProductId::new("p2"), 1)]
        );
        assert!(store.get(keys::GUEST_CART).unwrap().is_none());
        assert_eq!(cart.count(), 2);
    }

    #[tokio::test]
    async fn test_merge_partial_failure_skips_line_and_still_clears() {
        let server = FakeCartServer {
            fail_add_for: Some(ProductId::new("p2")),
            ..FakeCartServer::default()
        };
        let products = FakeProducts::default();
        let session = SharedSession::new();
        let store = MemoryStore::new();
        seed_guest_cart(&store, &[("p1", 2), ("p2", 1)]);

        let mut cart = engine(&server, &products, &session, &store);
        session.set_authenticated(true);
        cart.merge_carts_after_login().await;

        // The failing line is dropped, the survivor made it across, and
        // the guest store is cleared regardless
        assert_eq!(server.server_lines(), vec![(ProductId::new("p1"), 2)]);
        assert!(store.get(keys::GUEST_CART).unwrap().is_none());
        assert_eq!(cart.count(), 1);
        assert_eq!(cart.items()[0].product_id, ProductId::new("p1"));
    }

    #[tokio::test]
    async fn test_logout_starts_a_fresh_empty_guest_cart() {
        let server = FakeCartServer {
            lines: Mutex::new(vec![(ProductId::new("p1"), 3)]),
            ..FakeCartServer::default()
        };
        let products = FakeProducts::default();
        let session = SharedSession::new();
        session.set_authenticated(true);
        let store = MemoryStore::new();

        let mut cart = engine(&server, &products, &session, &store);
        cart.load_cart().await;
        assert_eq!(cart.count(), 1);

        session.set_authenticated(false);
        cart.logout();

        assert_eq!(cart.mode(), CartMode::Guest);
        assert!(cart.items().is_empty());
    }
}
