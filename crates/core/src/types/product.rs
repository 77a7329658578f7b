//! Product and category types.
//!
//! These mirror the backend's JSON documents. The backend populates
//! reference fields inconsistently depending on the endpoint: `categoryId`
//! may arrive as a bare id string or as an expanded
//! `{_id, name, slug}` object, and `image` may be a single URL or a list.
//! The untagged enums below absorb both shapes at the deserialization
//! boundary so the rest of the code never has to care.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::id::{CategoryId, ProductId};

/// A product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Backend-assigned identifier.
    #[serde(rename = "_id")]
    pub id: CategoryId,
    /// Display name.
    pub name: String,
    /// URL slug, if the backend provides one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// A category reference as it appears inside a product document.
///
/// Either a bare id (unpopulated) or the expanded category object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CategoryRef {
    /// Expanded `{_id, name, ...}` object.
    Expanded(Category),
    /// Bare id string.
    Id(CategoryId),
}

impl CategoryRef {
    /// Resolve the category identifier regardless of population.
    #[must_use]
    pub const fn id(&self) -> &CategoryId {
        match self {
            Self::Expanded(category) => &category.id,
            Self::Id(id) => id,
        }
    }
}

/// Product image reference: a single URL or a list of URLs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ImageRef {
    /// A single image URL.
    One(String),
    /// Multiple image URLs; the first is the primary image.
    Many(Vec<String>),
}

impl ImageRef {
    /// The primary image URL, if any.
    #[must_use]
    pub fn primary(&self) -> Option<&str> {
        match self {
            Self::One(url) => Some(url.as_str()),
            Self::Many(urls) => urls.first().map(String::as_str),
        }
    }
}

/// A storefront product.
///
/// Immutable from the engines' point of view: the catalog and cart engines
/// only filter, sort, and snapshot products, never mutate them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    /// Backend-assigned identifier, stable and unique.
    #[serde(rename = "_id")]
    pub id: ProductId,
    /// Display name (searched case-insensitively).
    pub name: String,
    /// Long description (searched case-insensitively).
    #[serde(default)]
    pub description: String,
    /// Unit price, non-negative.
    pub price: Decimal,
    /// Category reference; absent when the backend has not populated it.
    #[serde(default, rename = "categoryId", skip_serializing_if = "Option::is_none")]
    pub category: Option<CategoryRef>,
    /// Units in stock; governs purchasability.
    #[serde(default)]
    pub stock: u32,
    /// Lifetime units sold; 0 when never sold.
    #[serde(default)]
    pub sold_count: u64,
    /// Creation timestamp; absent is treated as the epoch.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    /// Display image(s); carried for the UI, never inspected here.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageRef>,
}

impl Product {
    /// Resolved category id, if a category reference is present.
    #[must_use]
    pub const fn category_id(&self) -> Option<&CategoryId> {
        match &self.category {
            Some(category) => Some(category.id()),
            None => None,
        }
    }

    /// Creation timestamp, with absence mapped to the epoch so that
    /// products without a timestamp sort as "oldest possible".
    #[must_use]
    pub fn created_at_or_epoch(&self) -> DateTime<Utc> {
        self.created_at.unwrap_or(DateTime::UNIX_EPOCH)
    }

    /// Whether the product can currently be purchased.
    #[must_use]
    pub const fn is_in_stock(&self) -> bool {
        self.stock > 0
    }
}
