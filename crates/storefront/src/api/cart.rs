//! Server cart client (authenticated sessions only).
//!
//! Cart state is never cached: every read goes to the backend, and the
//! cart engine resyncs with a full `get` after each mutation.

use std::sync::Arc;

use serde_json::json;
use tracing::instrument;

use copperleaf_core::ProductId;

use crate::config::StorefrontConfig;

use super::types::{CartSnapshot, cart_from_value};
use super::{ApiError, CartGateway, RestTransport};

/// Client for the backend's `/cart` endpoints.
#[derive(Clone)]
pub struct CartClient {
    inner: Arc<RestTransport>,
}

impl CartClient {
    /// Create a new cart client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Ok(Self {
            inner: Arc::new(RestTransport::new(config)?),
        })
    }

    /// Fetch the current cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the payload has no `items`
    /// array.
    #[instrument(skip(self))]
    pub async fn get(&self) -> Result<CartSnapshot, ApiError> {
        let value = self.inner.get_value("cart").await?;
        cart_from_value(value)
    }

    /// Add a quantity of a product (server-side add-or-increment).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        self.inner
            .post(
                "cart/add",
                &json!({"productId": product_id, "quantity": quantity}),
            )
            .await
    }

    /// Remove a product's line entirely.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
        self.inner
            .delete(&format!("cart/remove/{product_id}"))
            .await
    }

    /// Set the quantity of a product's line.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn update(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        self.inner
            .put(
                "cart/update",
                &json!({"productId": product_id, "quantity": quantity}),
            )
            .await
    }
}

impl CartGateway for CartClient {
    async fn get(&self) -> Result<CartSnapshot, ApiError> {
        Self::get(self).await
    }

    async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        Self::add(self, product_id, quantity).await
    }

    async fn remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
        Self::remove(self, product_id).await
    }

    async fn update(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        Self::update(self, product_id, quantity).await
    }
}
