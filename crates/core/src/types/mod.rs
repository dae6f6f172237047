//! Core types for ConstruMax.
//!
//! This module provides the catalog and cart domain types.

pub mod cart;
pub mod id;
pub mod price;
pub mod product;

pub use cart::{Cart, CartError, CartLine};
pub use id::ProductId;
pub use price::{CurrencyCode, Price};
pub use product::{
    Catalog, CategoryFilter, PLACEHOLDER_IMAGE, Product, SHOP_CATEGORIES, StockLevel,
};
