//! ConstruMax Storefront library.
//!
//! Catalog loading, the persisted cart and the HTTP storefront, exposed as a
//! library so the binary, the CLI and the integration tests share them.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod catalog;
pub mod config;
pub mod error;
pub mod middleware;
pub mod render;
pub mod routes;
pub mod state;
pub mod storage;
