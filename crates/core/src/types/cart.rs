//! Cart line types.
//!
//! Two representations exist side by side:
//!
//! - [`StoredCartItem`] - the persisted guest-cart shape, just
//!   `{productId, quantity}` with no product snapshot.
//! - [`CartLine`] - the in-memory view the UI renders, optionally carrying
//!   a denormalized [`Product`] snapshot for display.
//!
//! Server cart responses embed the product reference in the `productId`
//! field, which the backend may populate with the full product document.
//! [`ProductRef`] absorbs both shapes.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::product::Product;

/// A product reference inside a server cart line.
///
/// The backend stores a bare id but usually returns the populated product
/// document in its place.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProductRef {
    /// Populated product document.
    Expanded(Box<Product>),
    /// Bare product id.
    Id(ProductId),
}

impl ProductRef {
    /// Resolve the product identifier regardless of population.
    #[must_use]
    pub fn id(&self) -> &ProductId {
        match self {
            Self::Expanded(product) => &product.id,
            Self::Id(id) => id,
        }
    }

    /// Split into the identifier and the snapshot, if one was populated.
    #[must_use]
    pub fn into_parts(self) -> (ProductId, Option<Product>) {
        match self {
            Self::Expanded(product) => (product.id.clone(), Some(*product)),
            Self::Id(id) => (id, None),
        }
    }
}

/// The persisted guest-cart line shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCartItem {
    /// Referenced product.
    pub product_id: ProductId,
    /// Positive quantity.
    pub quantity: u32,
}

impl StoredCartItem {
    /// Create a stored line.
    #[must_use]
    pub const fn new(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
        }
    }
}

/// One (product, quantity) pairing within the in-memory cart view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    /// Referenced product.
    pub product_id: ProductId,
    /// Positive quantity.
    pub quantity: u32,
    /// Denormalized product snapshot for display; absent transiently when
    /// hydration has not run or failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<Product>,
}

impl CartLine {
    /// A line without a product snapshot.
    #[must_use]
    pub const fn bare(product_id: ProductId, quantity: u32) -> Self {
        Self {
            product_id,
            quantity,
            product: None,
        }
    }

    /// A line carrying a product snapshot.
    #[must_use]
    pub fn hydrated(product: Product, quantity: u32) -> Self {
        Self {
            product_id: product.id.clone(),
            quantity,
            product: Some(product),
        }
    }
}

impl From<StoredCartItem> for CartLine {
    fn from(item: StoredCartItem) -> Self {
        Self::bare(item.product_id, item.quantity)
    }
}
