//! Copperleaf Core - Shared types library.
//!
//! This crate provides the domain types used across all Copperleaf
//! components:
//! - `storefront` - Client-side catalog and cart engines
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients. This keeps
//! it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, plus product and cart
//!   line types

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
