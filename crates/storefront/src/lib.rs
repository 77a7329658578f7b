//! Copperleaf Storefront library.
//!
//! Client-side engines for the Copperleaf storefront: the product catalog
//! (filtering, sorting, pagination over a bulk-loaded product set) and the
//! dual-mode cart (guest cart persisted locally, server cart for
//! authenticated sessions, merged on login).
//!
//! # Architecture
//!
//! - The backend is the source of truth for pricing, inventory, and order
//!   state - this crate is a presentation-side state layer over its REST API
//! - Collaborators are injected: engines receive their gateways and the
//!   key-value store as constructor parameters, never via ambient lookup
//! - All derived views (filtered lists, page slices, pagination totals) are
//!   pure functions of current state, recomputed on read
//!
//! # Modules
//!
//! - [`config`] - Environment-driven configuration
//! - [`api`] - REST clients and the gateway traits the engines consume
//! - [`storage`] - Key-value persistence for the guest cart
//! - [`session`] - Authentication probe injected into the cart engine
//! - [`catalog`] - [`catalog::ProductListEngine`]
//! - [`cart`] - [`cart::CartEngine`]

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod cart;
pub mod catalog;
pub mod config;
pub mod session;
pub mod storage;
