//! REST API clients for the Copperleaf backend.
//!
//! # Architecture
//!
//! - Plain JSON-over-HTTP via `reqwest`; the backend wraps most payloads in
//!   a `{message, data, pagination}` envelope, unwrapped here
//! - The backend is the source of truth - no local sync, direct API calls
//! - In-memory caching via `moka` for product-by-id lookups (5 minute TTL)
//! - Engines consume the [`ProductGateway`] and [`CartGateway`] traits, so
//!   tests substitute in-memory fakes and never touch the network
//!
//! # Example
//!
//! ```rust,ignore
//! use copperleaf_storefront::api::{ProductGateway, ProductsClient};
//! use copperleaf_storefront::config::StorefrontConfig;
//!
//! let config = StorefrontConfig::from_env()?;
//! let products = ProductsClient::new(&config)?;
//! let all = products.list_all().await?;
//! ```

mod cart;
mod categories;
mod products;
pub mod types;

pub use cart::CartClient;
pub use categories::CategoriesClient;
pub use products::ProductsClient;
pub use types::{CartSnapshot, PaginationMeta, RawCartLine};

use reqwest::Method;
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use thiserror::Error;
use url::Url;

use copperleaf_core::{Product, ProductId};

use crate::config::StorefrontConfig;

/// Errors that can occur when talking to the backend API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// HTTP transport failed (connect, timeout, TLS, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, truncated for logging.
        body: String,
    },

    /// Server asked us to back off (HTTP 429).
    #[error("rate limited, retry after {0}s")]
    RateLimited(u64),

    /// Response body was not valid JSON for the expected type.
    #[error("failed to parse response: {0}")]
    Parse(#[from] serde_json::Error),

    /// Requested entity does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Response parsed as JSON but did not have the expected shape
    /// (e.g., a cart payload without an `items` array).
    #[error("malformed response: {0}")]
    ShapeMismatch(String),

    /// Request path did not join onto the base URL.
    #[error("invalid request URL: {0}")]
    Url(#[from] url::ParseError),
}

// =============================================================================
// Gateway Traits
// =============================================================================

/// Read access to the product catalog.
#[allow(async_fn_in_trait)]
pub trait ProductGateway {
    /// Fetch the full product set (large-limit bulk load).
    async fn list_all(&self) -> Result<Vec<Product>, ApiError>;

    /// Fetch a single product by id.
    async fn get_by_id(&self, id: &ProductId) -> Result<Product, ApiError>;

    /// Products ranked as best sellers by the backend.
    async fn best_sellers(&self) -> Result<Vec<Product>, ApiError>;

    /// Recently added products, as ranked by the backend.
    async fn new_arrivals(&self) -> Result<Vec<Product>, ApiError>;
}

/// The authenticated user's server-side cart.
#[allow(async_fn_in_trait)]
pub trait CartGateway {
    /// Fetch the current cart.
    async fn get(&self) -> Result<CartSnapshot, ApiError>;

    /// Add a quantity of a product (server-side add-or-increment).
    async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError>;

    /// Remove a product's line entirely.
    async fn remove(&self, product_id: &ProductId) -> Result<(), ApiError>;

    /// Set the quantity of a product's line.
    async fn update(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError>;
}

impl<T: ProductGateway + ?Sized> ProductGateway for &T {
    async fn list_all(&self) -> Result<Vec<Product>, ApiError> {
        (**self).list_all().await
    }

    async fn get_by_id(&self, id: &ProductId) -> Result<Product, ApiError> {
        (**self).get_by_id(id).await
    }

    async fn best_sellers(&self) -> Result<Vec<Product>, ApiError> {
        (**self).best_sellers().await
    }

    async fn new_arrivals(&self) -> Result<Vec<Product>, ApiError> {
        (**self).new_arrivals().await
    }
}

impl<T: CartGateway + ?Sized> CartGateway for &T {
    async fn get(&self) -> Result<CartSnapshot, ApiError> {
        (**self).get().await
    }

    async fn add(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        (**self).add(product_id, quantity).await
    }

    async fn remove(&self, product_id: &ProductId) -> Result<(), ApiError> {
        (**self).remove(product_id).await
    }

    async fn update(&self, product_id: &ProductId, quantity: u32) -> Result<(), ApiError> {
        (**self).update(product_id, quantity).await
    }
}

// =============================================================================
// Transport
// =============================================================================

/// How much response body to keep in error values and logs.
const ERROR_BODY_LIMIT: usize = 500;

/// Shared request plumbing for the concrete clients.
///
/// Attaches the bearer token, maps 429 to [`ApiError::RateLimited`] using
/// `Retry-After`, and captures body text on failures for diagnostics.
#[derive(Debug, Clone)]
pub(crate) struct RestTransport {
    client: reqwest::Client,
    base_url: Url,
    bearer_token: Option<String>,
}

impl RestTransport {
    pub(crate) fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.http_timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            bearer_token: config
                .api_token
                .as_ref()
                .map(|t| t.expose_secret().to_string()),
        })
    }

    /// Send a request and return the raw body text of a successful response.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<&serde_json::Value>,
    ) -> Result<String, ApiError> {
        let url = self.base_url.join(path)?;

        let mut request = self.client.request(method, url);
        if let Some(token) = &self.bearer_token {
            request = request.bearer_auth(token);
        }
        if let Some(json) = body {
            request = request.json(json);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let response_text = response.text().await?;

        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(ApiError::NotFound(
                response_text.chars().take(ERROR_BODY_LIMIT).collect(),
            ));
        }

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %response_text.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
                "Backend API returned non-success status"
            );
            return Err(ApiError::Status {
                status: status.as_u16(),
                body: response_text.chars().take(ERROR_BODY_LIMIT).collect(),
            });
        }

        Ok(response_text)
    }

    /// GET a JSON value.
    pub(crate) async fn get_value(&self, path: &str) -> Result<serde_json::Value, ApiError> {
        let text = self.send(Method::GET, path, None).await?;
        parse_json(&text)
    }

    /// POST a JSON body, discarding the response payload.
    pub(crate) async fn post(
        &self,
        path: &str,
        body: &serde_json::Value,
    ) -> Result<(), ApiError> {
        self.send(Method::POST, path, Some(body)).await?;
        Ok(())
    }

    /// PUT a JSON body, discarding the response payload.
    pub(crate) async fn put(&self, path: &str, body: &serde_json::Value) -> Result<(), ApiError> {
        self.send(Method::PUT, path, Some(body)).await?;
        Ok(())
    }

    /// DELETE, discarding the response payload.
    pub(crate) async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, None).await?;
        Ok(())
    }
}

/// Parse response text, logging a body snippet on failure.
fn parse_json<T: DeserializeOwned>(text: &str) -> Result<T, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %text.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
            "Failed to parse backend response"
        );
        ApiError::Parse(e)
    })
}
