//! Cart state machine.
//!
//! A [`Cart`] holds at most one [`CartLine`] per product. Lines move through
//! three transitions only:
//!
//! ```text
//! ABSENT ──add──▶ PRESENT(n) ──add / set_quantity(m > 0)──▶ PRESENT(m)
//!                     │
//!                     └──remove / set_quantity(≤ 0)──▶ ABSENT
//! ```
//!
//! Quantities are bounded by the product's stock in the catalog passed to each
//! operation. Prices are snapshotted into the line when it is created, so the
//! cart total does not move when the catalog is refreshed.
//!
//! A line is only admitted when the resulting cart total is representable,
//! so [`Cart::total`] never overflows.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::id::ProductId;
use super::product::Catalog;

/// Validation failures for cart operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// No product with this id in the current catalog.
    #[error("product not found: {0}")]
    ProductNotFound(ProductId),
    /// The resulting quantity would exceed the product's stock.
    #[error("insufficient stock for {product_id}: requested {requested}, only {available} available")]
    InsufficientStock {
        /// Product being added or updated.
        product_id: ProductId,
        /// Total quantity the line would have held.
        requested: u64,
        /// Units in stock.
        available: u32,
    },
    /// Quantity must be at least one.
    #[error("quantity must be at least 1")]
    InvalidQuantity,
    /// The cart total would exceed the largest representable amount.
    #[error("cart total would overflow with {0}")]
    TotalOverflow(ProductId),
}

/// One cart entry.
///
/// Serialized as `{"productId": "...", "quantity": 3, "price": 100}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: u32,
    /// Unit price captured when the line was created.
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
}

impl CartLine {
    /// Snapshot price times quantity, or `None` if it overflows.
    #[must_use]
    pub fn checked_subtotal(&self) -> Option<Decimal> {
        self.price.checked_mul(Decimal::from(self.quantity))
    }

    /// Snapshot price times quantity, saturating at [`Decimal::MAX`].
    #[must_use]
    pub fn subtotal(&self) -> Decimal {
        self.checked_subtotal().unwrap_or(Decimal::MAX)
    }
}

/// Shopping cart keyed by product id, in insertion order.
///
/// Deserializing goes through [`Cart::from_lines`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(transparent)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl<'de> Deserialize<'de> for Cart {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Vec::<CartLine>::deserialize(deserializer).map(Self::from_lines)
    }
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Build a cart from previously stored lines.
    ///
    /// Stored data may have been edited by hand, so zero-quantity lines are
    /// dropped and repeated product ids are merged into the first occurrence.
    /// A line that would push the total past [`Decimal::MAX`] is dropped.
    #[must_use]
    pub fn from_lines(lines: Vec<CartLine>) -> Self {
        let mut cart = Self::new();
        for line in lines {
            if line.quantity == 0 {
                continue;
            }
            match cart.position(&line.product_id) {
                Some(idx) => {
                    let Some(existing) = cart.lines.get(idx) else {
                        continue;
                    };
                    let quantity = existing.quantity.saturating_add(line.quantity);
                    if cart
                        .total_with(&line.product_id, existing.price, quantity)
                        .is_none()
                    {
                        continue;
                    }
                    if let Some(existing) = cart.lines.get_mut(idx) {
                        existing.quantity = quantity;
                    }
                }
                None => {
                    if cart
                        .total_with(&line.product_id, line.price, line.quantity)
                        .is_some()
                    {
                        cart.lines.push(line);
                    }
                }
            }
        }
        cart
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// The line for `product_id`, if any.
    #[must_use]
    pub fn line(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.product_id == product_id)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    fn position(&self, product_id: &ProductId) -> Option<usize> {
        self.lines.iter().position(|l| &l.product_id == product_id)
    }

    /// The total if `product_id`'s line held `quantity` units at `price`.
    fn total_with(&self, product_id: &ProductId, price: Decimal, quantity: u32) -> Option<Decimal> {
        let changed = price.checked_mul(Decimal::from(quantity))?;
        self.lines
            .iter()
            .filter(|l| &l.product_id != product_id)
            .try_fold(changed, |acc, l| acc.checked_add(l.checked_subtotal()?))
    }

    /// Add `quantity` units of a product, merging into an existing line.
    ///
    /// # Errors
    ///
    /// - [`CartError::InvalidQuantity`] if `quantity` is zero
    /// - [`CartError::ProductNotFound`] if the catalog has no such product
    /// - [`CartError::InsufficientStock`] if the line would exceed stock
    /// - [`CartError::TotalOverflow`] if the cart total would not fit
    ///
    /// The cart is unchanged on error.
    pub fn add(
        &mut self,
        catalog: &Catalog,
        product_id: &ProductId,
        quantity: u32,
    ) -> Result<CartLine, CartError> {
        if quantity == 0 {
            return Err(CartError::InvalidQuantity);
        }
        let product = catalog
            .find(product_id)
            .ok_or_else(|| CartError::ProductNotFound(product_id.clone()))?;

        let existing = self.line(product_id);
        let price = existing.map_or(product.price, |l| l.price);
        let existing = existing.map_or(0, |l| l.quantity);
        let requested = u64::from(existing) + u64::from(quantity);
        if requested > u64::from(product.stock) {
            return Err(CartError::InsufficientStock {
                product_id: product_id.clone(),
                requested,
                available: product.stock,
            });
        }

        // requested <= stock, so it fits in u32
        let new_quantity = existing + quantity;
        if self.total_with(product_id, price, new_quantity).is_none() {
            return Err(CartError::TotalOverflow(product_id.clone()));
        }

        if let Some(line) = self.lines.iter_mut().find(|l| &l.product_id == product_id) {
            line.quantity = new_quantity;
            return Ok(line.clone());
        }

        let line = CartLine {
            product_id: product_id.clone(),
            quantity: new_quantity,
            price,
        };
        self.lines.push(line.clone());
        Ok(line)
    }

    /// Remove the line for `product_id`. Returns whether a line was removed.
    pub fn remove(&mut self, product_id: &ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|l| &l.product_id != product_id);
        self.lines.len() != before
    }

    /// Overwrite a line's quantity.
    ///
    /// `quantity <= 0` removes the line. A missing line, or a line whose
    /// product has left the catalog, is left alone and yields `Ok(None)`.
    /// The price snapshot is kept.
    ///
    /// # Errors
    ///
    /// Returns [`CartError::InsufficientStock`] if `quantity` exceeds stock,
    /// or [`CartError::TotalOverflow`] if the cart total would not fit. The
    /// line is unchanged on error.
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
        let Some(product) = catalog.find(product_id) else {
            return Ok(None);
        };
        let Some(price) = self.line(product_id).map(|l| l.price) else {
            return Ok(None);
        };

        let quantity = match u32::try_from(quantity) {
            Ok(q) if q <= product.stock => q,
            _ => {
                return Err(CartError::InsufficientStock {
                    product_id: product_id.clone(),
                    requested: quantity.unsigned_abs(),
                    available: product.stock,
                });
            }
        };

        if self.total_with(product_id, price, quantity).is_none() {
            return Err(CartError::TotalOverflow(product_id.clone()));
        }

        let Some(line) = self.lines.iter_mut().find(|l| &l.product_id == product_id) else {
            return Ok(None);
        };
        line.quantity = quantity;
        Ok(Some(line.clone()))
    }

    /// Sum of snapshot price times quantity over all lines.
    ///
    /// Saturates at [`Decimal::MAX`], which admitted lines never reach.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, l| acc.checked_add(l.checked_subtotal()?))
            .unwrap_or(Decimal::MAX)
    }

    /// Sum of all line quantities.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0_u32, |acc, l| acc.saturating_add(l.quantity))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::product::tests::product;

    fn p1_catalog() -> Catalog {
        Catalog::new(vec![product("P1", 100, 5), product("P2", 40, 2)])
    }

    fn p1() -> ProductId {
        ProductId::new("P1")
    }

    #[test]
    fn test_scenario_stock_bounded_cart() {
        let catalog = p1_catalog();
        let mut cart = Cart::new();

        let line = cart.add(&catalog, &p1(), 3).unwrap();
        assert_eq!(line.quantity, 3);
        assert_eq!(line.price, Decimal::new(100, 0));
        assert_eq!(cart.total(), Decimal::new(300, 0));

        let err = cart.add(&catalog, &p1(), 3).unwrap_err();
        assert_eq!(
            err,
            CartError::InsufficientStock {
                product_id: p1(),
                requested: 6,
                available: 5,
            }
        );
        assert_eq!(cart.line(&p1()).unwrap().quantity, 3);

        let line = cart.set_quantity(&catalog, &p1(), 5).unwrap().unwrap();
        assert_eq!(line.quantity, 5);
        assert_eq!(cart.total(), Decimal::new(500, 0));

        assert_eq!(cart.set_quantity(&catalog, &p1(), 0).unwrap(), None);
        assert!(cart.is_empty());
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.item_count(), 0);
    }

    #[test]
    fn test_add_merges_same_product() {
        let catalog = p1_catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, &p1(), 1).unwrap();
        cart.add(&catalog, &p1(), 2).unwrap();

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.item_count(), 3);
    }

    #[test]
    fn test_add_unknown_product() {
        let mut cart = Cart::new();
        let err = cart
            .add(&p1_catalog(), &ProductId::new("nope"), 1)
            .unwrap_err();
        assert_eq!(err, CartError::ProductNotFound(ProductId::new("nope")));
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_zero_quantity_rejected() {
        let mut cart = Cart::new();
        assert_eq!(
            cart.add(&p1_catalog(), &p1(), 0).unwrap_err(),
            CartError::InvalidQuantity
        );
        assert!(cart.is_empty());
    }

    #[test]
    fn test_add_new_line_over_stock_leaves_cart_unchanged() {
        let catalog = p1_catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, &ProductId::new("P2"), 1).unwrap();
        let before = cart.clone();

        assert!(cart.add(&catalog, &p1(), 6).is_err());
        assert!(cart.add(&catalog, &ProductId::new("P2"), 2).is_err());
        assert_eq!(cart, before);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let catalog = p1_catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, &p1(), 1).unwrap();

        assert!(cart.remove(&p1()));
        let after_first = cart.clone();
        assert!(!cart.remove(&p1()));
        assert_eq!(cart, after_first);
    }

    #[test]
    fn test_total_uses_snapshot_price() {
        let mut cart = Cart::new();
        cart.add(&p1_catalog(), &p1(), 2).unwrap();

        let repriced = Catalog::new(vec![product("P1", 999, 5)]);
        assert_eq!(cart.total(), Decimal::new(200, 0));

        // Quantity updates keep the original snapshot as well.
        cart.set_quantity(&repriced, &p1(), 3).unwrap();
        assert_eq!(cart.total(), Decimal::new(300, 0));

        // So do merges.
        cart.add(&repriced, &p1(), 1).unwrap();
        assert_eq!(cart.line(&p1()).unwrap().price, Decimal::new(100, 0));
    }

    #[test]
    fn test_set_quantity_over_stock_keeps_line() {
        let catalog = p1_catalog();
        let mut cart = Cart::new();
        cart.add(&catalog, &p1(), 2).unwrap();

        let err = cart.set_quantity(&catalog, &p1(), 6).unwrap_err();
        assert!(matches!(err, CartError::InsufficientStock { requested: 6, .. }));
        assert_eq!(cart.line(&p1()).unwrap().quantity, 2);
    }

    #[test]
    fn test_set_quantity_does_not_create_lines() {
        let mut cart = Cart::new();
        assert_eq!(cart.set_quantity(&p1_catalog(), &p1(), 2).unwrap(), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_set_quantity_dangling_line_is_noop() {
        let mut cart = Cart::new();
        cart.add(&p1_catalog(), &p1(), 2).unwrap();

        let reloaded = Catalog::new(vec![product("P2", 40, 2)]);
        assert_eq!(cart.set_quantity(&reloaded, &p1(), 1).unwrap(), None);
        assert_eq!(cart.line(&p1()).unwrap().quantity, 2);

        // Dangling lines still count toward the snapshot total.
        assert_eq!(cart.total(), Decimal::new(200, 0));

        // But can still be removed.
        assert_eq!(cart.set_quantity(&reloaded, &p1(), -1).unwrap(), None);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_from_lines_restores_invariants() {
        let line = |id: &str, quantity| CartLine {
            product_id: ProductId::new(id),
            quantity,
            price: Decimal::new(10, 0),
        };
        let cart = Cart::from_lines(vec![line("a", 1), line("b", 0), line("a", 2), line("c", 1)]);

        assert_eq!(cart.lines().len(), 2);
        assert_eq!(cart.line(&ProductId::new("a")).unwrap().quantity, 3);
        assert!(cart.line(&ProductId::new("b")).is_none());
        assert_eq!(cart.item_count(), 4);
    }

    fn priced(id: &str, price: Decimal, stock: u32) -> crate::types::product::Product {
        let mut product = product(id, 0, stock);
        product.price = price;
        product
    }

    #[test]
    fn test_add_rejects_total_overflow() {
        let catalog = Catalog::new(vec![
            priced("huge", Decimal::MAX, 2),
            priced("half", Decimal::from_i128_with_scale(50_000_000_000_000_000_000_000_000_000, 0), 2),
        ]);
        let mut cart = Cart::new();

        assert_eq!(
            cart.add(&catalog, &ProductId::new("half"), 2).unwrap_err(),
            CartError::TotalOverflow(ProductId::new("half"))
        );
        assert!(cart.is_empty());

        cart.add(&catalog, &ProductId::new("huge"), 1).unwrap();
        assert_eq!(cart.total(), Decimal::MAX);
        assert_eq!(
            cart.add(&catalog, &ProductId::new("huge"), 1).unwrap_err(),
            CartError::TotalOverflow(ProductId::new("huge"))
        );
        assert_eq!(
            cart.add(&catalog, &ProductId::new("half"), 1).unwrap_err(),
            CartError::TotalOverflow(ProductId::new("half"))
        );
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_set_quantity_rejects_total_overflow() {
        let catalog = Catalog::new(vec![priced("huge", Decimal::MAX, 3)]);
        let mut cart = Cart::new();
        cart.add(&catalog, &ProductId::new("huge"), 1).unwrap();

        assert_eq!(
            cart.set_quantity(&catalog, &ProductId::new("huge"), 3).unwrap_err(),
            CartError::TotalOverflow(ProductId::new("huge"))
        );
        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total(), Decimal::MAX);
    }

    #[test]
    fn test_from_lines_drops_overflowing_lines() {
        let line = |id: &str, quantity, price| CartLine {
            product_id: ProductId::new(id),
            quantity,
            price,
        };
        let cart = Cart::from_lines(vec![
            line("a", 1, Decimal::new(10, 0)),
            line("huge", 2, Decimal::MAX),
            line("b", 1, Decimal::MAX),
            line("a", 1, Decimal::new(10, 0)),
        ]);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.line(&ProductId::new("a")).unwrap().quantity, 2);
        assert_eq!(cart.total(), Decimal::new(20, 0));

        let restored: Cart = serde_json::from_str(
            r#"[{"productId":"huge","quantity":2,"price":5e28},{"productId":"a","quantity":1,"price":5}]"#,
        )
        .unwrap();
        assert_eq!(restored.total(), Decimal::new(5, 0));
    }

    #[test]
    fn test_json_shape_matches_stored_format() {
        let mut cart = Cart::new();
        cart.add(&p1_catalog(), &p1(), 3).unwrap();

        let json = serde_json::to_value(&cart).unwrap();
        assert_eq!(json[0]["productId"], "P1");
        assert_eq!(json[0]["quantity"], 3);
        assert_eq!(json[0]["price"], 100.0);

        let restored: Cart =
            serde_json::from_str(r#"[{"productId":"P1","quantity":3,"price":100}]"#).unwrap();
        assert_eq!(restored, cart);
    }
}
