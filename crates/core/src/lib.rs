//! ConstruMax Core - Shared domain library.
//!
//! This crate provides the types used across all ConstruMax components:
//! - `storefront` - Catalog loading, cart persistence and the public site
//! - `cli` - Command-line access to the catalog and the persisted cart
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no storage,
//! no HTTP clients. Cart operations take the catalog they validate against
//! as an argument, so the same state machine backs the web handlers, the CLI
//! and the tests.
//!
//! # Modules
//!
//! - [`types`] - Product ids, prices, catalog queries and the cart state machine

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
