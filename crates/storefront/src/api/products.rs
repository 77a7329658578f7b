//! Product catalog client.
//!
//! Wraps the backend's `/product` endpoints. Single-product lookups are
//! cached for 5 minutes because guest-cart hydration fetches one product
//! per stored line and tends to ask for the same handful repeatedly.

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use copperleaf_core::{Product, ProductId};

use crate::config::StorefrontConfig;

use super::types::{product_from_value, products_from_value};
use super::{ApiError, ProductGateway, RestTransport};

/// Effectively "all products" for the bulk catalog load.
const BULK_LOAD_LIMIT: u32 = 1000;

/// Client for the backend's product endpoints.
#[derive(Clone)]
pub struct ProductsClient {
    inner: Arc<ProductsClientInner>,
}

struct ProductsClientInner {
    transport: RestTransport,
    by_id_cache: Cache<ProductId, Product>,
}

impl ProductsClient {
    /// Create a new product client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let by_id_cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Ok(Self {
            inner: Arc::new(ProductsClientInner {
                transport: RestTransport::new(config)?,
                by_id_cache,
            }),
        })
    }

    /// Fetch the full product set with a large limit.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list_all(&self) -> Result<Vec<Product>, ApiError> {
        let value = self
            .inner
            .transport
            .get_value(&format!("product?limit={BULK_LOAD_LIMIT}"))
            .await?;
        products_from_value(value)
    }

    /// Fetch one product by id, through the cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(id = %id))]
    pub async fn get_by_id(&self, id: &ProductId) -> Result<Product, ApiError> {
        if let Some(product) = self.inner.by_id_cache.get(id).await {
            debug!("Cache hit for product");
            return Ok(product);
        }

        let value = self
            .inner
            .transport
            .get_value(&format!("product/id/{id}"))
            .await?;
        let product = product_from_value(value)?;

        self.inner
            .by_id_cache
            .insert(id.clone(), product.clone())
            .await;

        Ok(product)
    }

    /// Fetch one product by its URL slug (uncached; slug lookups come from
    /// navigation, not hydration loops).
    ///
    /// # Errors
    ///
    /// Returns an error if the product is not found or the request fails.
    #[instrument(skip(self), fields(slug = %slug))]
    pub async fn get_by_slug(&self, slug: &str) -> Result<Product, ApiError> {
        let value = self
            .inner
            .transport
            .get_value(&format!("product/{slug}"))
            .await?;
        product_from_value(value)
    }

    /// Products ranked as best sellers by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn best_sellers(&self) -> Result<Vec<Product>, ApiError> {
        let value = self.inner.transport.get_value("product/best-sellers").await?;
        products_from_value(value)
    }

    /// Recently added products, as ranked by the backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn new_arrivals(&self) -> Result<Vec<Product>, ApiError> {
        let value = self.inner.transport.get_value("product/new-arrivals").await?;
        products_from_value(value)
    }

    // =========================================================================
    // Cache Management
    // =========================================================================

    /// Invalidate a cached product.
    pub async fn invalidate(&self, id: &ProductId) {
        self.inner.by_id_cache.invalidate(id).await;
    }

    /// Invalidate all cached products.
    pub async fn invalidate_all(&self) {
        self.inner.by_id_cache.invalidate_all();
        self.inner.by_id_cache.run_pending_tasks().await;
    }
}

impl ProductGateway for ProductsClient {
    async fn list_all(&self) -> Result<Vec<Product>, ApiError> {
        Self::list_all(self).await
    }

    async fn get_by_id(&self, id: &ProductId) -> Result<Product, ApiError> {
        Self::get_by_id(self, id).await
    }

    async fn best_sellers(&self) -> Result<Vec<Product>, ApiError> {
        Self::best_sellers(self).await
    }

    async fn new_arrivals(&self) -> Result<Vec<Product>, ApiError> {
        Self::new_arrivals(self).await
    }
}
