//! Category client.
//!
//! The category filter dropdown is fed from `/category`. Same lenient
//! envelope handling as the product list.

use std::sync::Arc;

use tracing::instrument;

use copperleaf_core::Category;

use crate::config::StorefrontConfig;

use super::{ApiError, RestTransport};

/// Client for the backend's `/category` endpoints.
#[derive(Clone)]
pub struct CategoriesClient {
    inner: Arc<RestTransport>,
}

impl CategoriesClient {
    /// Create a new categories client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        Ok(Self {
            inner: Arc::new(RestTransport::new(config)?),
        })
    }

    /// Fetch all categories.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the response is malformed.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<Category>, ApiError> {
        let value = self.inner.get_value("category").await?;
        match value {
            serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
            serde_json::Value::Object(mut object) => match object.remove("data") {
                Some(data @ serde_json::Value::Array(_)) => Ok(serde_json::from_value(data)?),
                _ => Err(ApiError::ShapeMismatch(
                    "category response has no array payload".to_string(),
                )),
            },
            _ => Err(ApiError::ShapeMismatch(
                "category response is not an array or object".to_string(),
            )),
        }
    }
}
