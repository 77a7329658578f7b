//! Wire types for the backend's JSON envelopes.
//!
//! List endpoints usually answer `{message, data: [...], pagination}`, but
//! some deployments return the bare array. The extraction helpers accept
//! both and reject anything else as a shape mismatch rather than letting a
//! confusing `Parse` error surface.

use serde::{Deserialize, Serialize};

use copperleaf_core::{Product, ProductRef};

use super::ApiError;

/// Backend pagination metadata, as returned inside list envelopes.
///
/// Unused by the catalog engine (which paginates client-side over the bulk
/// load) but carried for hosts that want it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct PaginationMeta {
    /// Total matching items.
    #[serde(default)]
    pub total: u64,
    /// 1-indexed page number.
    #[serde(default)]
    pub page: u32,
    /// Page size the backend applied.
    #[serde(default)]
    pub limit: u32,
    /// Total pages.
    #[serde(default)]
    pub pages: u32,
}

/// One raw line of the server cart, before normalization.
///
/// The backend populates `productId` with the full product document, so the
/// field deserializes through [`ProductRef`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawCartLine {
    /// Product reference (bare id or populated document).
    #[serde(rename = "productId")]
    pub product: ProductRef,
    /// Line quantity.
    pub quantity: u32,
}

/// The server cart as returned by `GET /cart`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CartSnapshot {
    /// Raw cart lines.
    pub lines: Vec<RawCartLine>,
}

/// Extract a product array from a list response.
///
/// Accepts either the `{data: [...]}` envelope or a bare array.
///
/// # Errors
///
/// Returns [`ApiError::ShapeMismatch`] for any other shape and
/// [`ApiError::Parse`] when the array elements do not deserialize.
pub(crate) fn products_from_value(value: serde_json::Value) -> Result<Vec<Product>, ApiError> {
    match value {
        serde_json::Value::Array(_) => Ok(serde_json::from_value(value)?),
        serde_json::Value::Object(mut object) => match object.remove("data") {
            Some(data @ serde_json::Value::Array(_)) => Ok(serde_json::from_value(data)?),
            Some(_) => Err(ApiError::ShapeMismatch(
                "list response `data` field is not an array".to_string(),
            )),
            None => Err(ApiError::ShapeMismatch(
                "list response has neither an array body nor a `data` field".to_string(),
            )),
        },
        _ => Err(ApiError::ShapeMismatch(
            "list response is not an array or object".to_string(),
        )),
    }
}

/// Extract a single product from a `{data: {...}}` envelope, accepting a
/// bare product object as a fallback.
pub(crate) fn product_from_value(value: serde_json::Value) -> Result<Product, ApiError> {
    match value {
        serde_json::Value::Object(mut object) => {
            let inner = object.remove("data").map_or_else(
                || serde_json::Value::Object(object),
                |data| data,
            );
            Ok(serde_json::from_value(inner)?)
        }
        _ => Err(ApiError::ShapeMismatch(
            "product response is not an object".to_string(),
        )),
    }
}

/// Validate and extract the cart payload.
///
/// The `items` array must be present; anything else is a shape mismatch
/// (the cart engine treats that the same as a load failure).
pub(crate) fn cart_from_value(value: serde_json::Value) -> Result<CartSnapshot, ApiError> {
    let serde_json::Value::Object(mut object) = value else {
        return Err(ApiError::ShapeMismatch(
            "cart response is not an object".to_string(),
        ));
    };

    match object.remove("items") {
        Some(items @ serde_json::Value::Array(_)) => Ok(CartSnapshot {
            lines: serde_json::from_value(items)?,
        }),
        Some(_) => Err(ApiError::ShapeMismatch(
            "cart response `items` field is not an array".to_string(),
        )),
        None => Err(ApiError::ShapeMismatch(
            "cart response has no `items` array".to_string(),
        )),
    }
}
