//! Persisted cart.
//!
//! [`CartStore`] wraps the core [`Cart`] state machine with durable storage
//! and change notification. Every mutation writes the whole cart back under
//! [`CART_STORAGE_KEY`] before returning and publishes the new item count to
//! subscribers (the header badge).
//!
//! Storage failures never fail a cart operation: the in-memory cart stays
//! authoritative and the failure is logged.

use std::sync::Arc;

use construmax_core::{Cart, CartError, CartLine, Catalog, ProductId};
use rust_decimal::Decimal;
use serde::Serialize;
use tokio::sync::watch;

use crate::storage::{KeyValueStore, StorageError};

/// Storage key holding the serialized cart lines.
pub const CART_STORAGE_KEY: &str = "construmax_cart";

/// The cart plus its persistence and observers.
pub struct CartStore {
    cart: Cart,
    storage: Arc<dyn KeyValueStore>,
    count: watch::Sender<u32>,
}

impl std::fmt::Debug for CartStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CartStore")
            .field("cart", &self.cart)
            .field("subscribers", &self.count.receiver_count())
            .finish_non_exhaustive()
    }
}

impl CartStore {
    /// Restore the cart from storage.
    ///
    /// Missing, unreadable or malformed data yields an empty cart.
    #[must_use]
    pub fn restore(storage: Arc<dyn KeyValueStore>) -> Self {
        let cart = match storage.get(CART_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<CartLine>>(&raw) {
                Ok(lines) => Cart::from_lines(lines),
                Err(e) => {
                    tracing::warn!(error = %e, "Stored cart is malformed, starting empty");
                    Cart::new()
                }
            },
            Ok(None) => Cart::new(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read stored cart, starting empty");
                Cart::new()
            }
        };

        tracing::debug!(lines = cart.lines().len(), "Cart restored");
        let (count, _) = watch::channel(cart.item_count());
        Self {
            cart,
            storage,
            count,
        }
    }

    /// Write the whole cart to storage.
    ///
    /// # Errors
    ///
    /// Returns an error if the cart cannot be serialized or written.
    pub fn persist(&self) -> Result<(), StorageError> {
        let json = serde_json::to_string(&self.cart)?;
        self.storage.set(CART_STORAGE_KEY, &json)
    }

    /// Receive the item count after every mutation.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<u32> {
        self.count.subscribe()
    }

    /// The underlying cart.
    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        self.cart.lines()
    }

    /// Sum of snapshot price times quantity.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.cart.total()
    }

    /// Number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.cart.item_count()
    }

    /// Add units of a product. See [`Cart::add`].
    ///
    /// # Errors
    ///
    /// Returns the cart's validation error; nothing is persisted in that case.
    pub fn add(
        &mut self,
        catalog: &Catalog,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartLine, CartError> {
        let line = self.cart.add(catalog, product_id, quantity)?;
        tracing::info!(product_id = %product_id, quantity = line.quantity, "Cart line added");
        self.commit();
        Ok(line)
    }

    /// Remove a product's line, if present.
    pub fn remove(&mut self, product_id: &ProductId) {
        if self.cart.remove(product_id) {
            tracing::info!(product_id = %product_id, "Cart line removed");
        }
        self.commit();
    }

    /// Overwrite a line's quantity. See [`Cart::set_quantity`].
    ///
    /// `quantity <= 0` behaves like [`CartStore::remove`]. Updates that leave
    /// the cart untouched (missing line, product gone from the catalog) are
    /// neither persisted nor published.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] when `quantity` exceeds stock,
    /// or [`CartError::TotalOverflow`] when the total would not fit.
    pub fn set_quantity(
        &mut self,
        catalog: &Catalog,
        product_id: &ProductId,
        quantity: i64,
    ) -> Result<Option<CartLine>, CartError> {
        if quantity <= 0 {
            self.remove(product_id);
            return Ok(None);
        }

        let line = self.cart.set_quantity(catalog, product_id, quantity)?;
        if line.is_some() {
            tracing::info!(product_id = %product_id, quantity, "Cart quantity set");
            self.commit();
        } else {
            tracing::debug!(product_id = %product_id, "Quantity update ignored, no matching line");
        }
        Ok(line)
    }

    /// Totals and lines in a serializable form.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary {
            lines: self.cart.lines().to_vec(),
            total: self.total(),
            item_count: self.item_count(),
        }
    }

    fn commit(&self) {
        if let Err(e) = self.persist() {
            tracing::error!(error = %e, "Failed to persist cart");
        }
        self.count.send_replace(self.cart.item_count());
    }
}

/// Cart contents for JSON responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartSummary {
    pub lines: Vec<CartLine>,
    #[serde(with = "rust_decimal::serde::float")]
    pub total: Decimal,
    pub item_count: u32,
}
