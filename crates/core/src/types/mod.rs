//! Core domain types.
//!
//! All types here mirror the backend's JSON contract (camelCase fields,
//! MongoDB-style `_id` identifiers) and are deliberately free of any I/O.

mod cart;
mod id;
mod product;

pub use cart::{CartLine, ProductRef, StoredCartItem};
pub use id::{CategoryId, ProductId};
pub use product::{Category, CategoryRef, ImageRef, Product};
