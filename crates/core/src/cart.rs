//! Shopping cart state.
//!
//! The cart is a client-side container: nothing is reserved on the backend
//! until checkout. It maps products to quantities and derives its totals.
//!
//! # Invariants
//!
//! - At most one line per product.
//! - Every line quantity is in `1..=MAX_LINE_QUANTITY`.

use serde::{Deserialize, Serialize};

use crate::types::{Price, ProductId, VendorId};

/// Upper bound for a single line's quantity.
pub const MAX_LINE_QUANTITY: u32 = 99;

/// What the cart knows about a product when it is added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartItem {
    /// Product being bought.
    pub product_id: ProductId,
    /// Display name at the time it was added.
    pub name: String,
    /// Unit price at the time it was added.
    pub unit_price: Price,
    /// Store selling the product.
    pub vendor_id: Option<VendorId>,
    /// Thumbnail.
    pub image_url: Option<String>,
}

/// A product and how many of it are in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(flatten)]
    pub item: CartItem,
    pub quantity: u32,
}

impl CartLine {
    /// Unit price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Price {
        self.item.unit_price * self.quantity
    }
}

/// The visitor's cart.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// An empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of `item`.
    ///
    /// Adding a product that is already in the cart increments its line
    /// instead of creating a second one; the stored name and price are
    /// refreshed from `item`. A quantity of 0 counts as 1.
    pub fn add(&mut self, item: CartItem, quantity: u32) {
        let quantity = quantity.max(1);

        if let Some(line) = self.line_mut(item.product_id) {
            line.quantity = line
                .quantity
                .saturating_add(quantity)
                .min(MAX_LINE_QUANTITY);
            line.item = item;
            return;
        }

        self.lines.push(CartLine {
            item,
            quantity: quantity.min(MAX_LINE_QUANTITY),
        });
    }

    /// Set the quantity of a product's line. A quantity of 0 removes it.
    ///
    /// Returns `false` if the product is not in the cart.
    pub fn set_quantity(&mut self, product_id: ProductId, quantity: u32) -> bool {
        if quantity == 0 {
            return self.remove(product_id);
        }

        match self.line_mut(product_id) {
            Some(line) => {
                line.quantity = quantity.min(MAX_LINE_QUANTITY);
                true
            }
            None => false,
        }
    }

    /// Remove a product's line. Returns `false` if it was not in the cart.
    pub fn remove(&mut self, product_id: ProductId) -> bool {
        let before = self.lines.len();
        self.lines.retain(|line| line.item.product_id != product_id);
        self.lines.len() != before
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Lines in the order they were first added.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of units across all lines.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|line| line.quantity).sum()
    }

    /// Sum of price × quantity over all lines.
    #[must_use]
    pub fn subtotal(&self) -> Price {
        self.lines.iter().map(CartLine::line_total).sum()
    }

    /// Distinct stores in the cart, in first-seen order.
    #[must_use]
    pub fn vendor_ids(&self) -> Vec<VendorId> {
        let mut vendors = Vec::new();
        for vendor in self.lines.iter().filter_map(|line| line.item.vendor_id) {
            if !vendors.contains(&vendor) {
                vendors.push(vendor);
            }
        }
        vendors
    }

    fn line_mut(&mut self, product_id: ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| line.item.product_id == product_id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn item(id: i64, price: i64) -> CartItem {
        CartItem {
            product_id: ProductId::new(id),
            name: format!("Producto {id}"),
            unit_price: Price::from_pesos(price),
            vendor_id: Some(VendorId::new(id % 2)),
            image_url: None,
        }
    }

    #[test]
    fn test_adding_twice_increments_instead_of_duplicating() {
        let mut cart = Cart::new();
        cart.add(item(1, 5_000), 1);
        cart.add(item(1, 5_000), 2);

        assert_eq!(cart.lines().len(), 1);
        assert_eq!(cart.lines()[0].quantity, 3);
    }

    #[test]
    fn test_subtotal_is_sum_of_price_times_quantity() {
        let mut cart = Cart::new();
        cart.add(item(1, 5_000), 2);
        cart.add(item(2, 12_990), 1);
        cart.add(item(3, 1_500), 4);

        assert_eq!(cart.subtotal(), Price::from_pesos(2 * 5_000 + 12_990 + 4 * 1_500));
        assert_eq!(cart.item_count(), 7);
    }

    #[test]
    fn test_zero_quantity_add_counts_as_one() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 0);
        assert_eq!(cart.item_count(), 1);
    }

    #[test]
    fn test_quantity_is_capped() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 80);
        cart.add(item(1, 100), 80);
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);

        assert!(cart.set_quantity(ProductId::new(1), 500));
        assert_eq!(cart.lines()[0].quantity, MAX_LINE_QUANTITY);
    }

    #[test]
    fn test_re_adding_refreshes_price() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 1);
        cart.add(item(1, 120), 1);
        assert_eq!(cart.subtotal(), Price::from_pesos(240));
    }

    #[test]
    fn test_set_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 3);
        cart.add(item(2, 100), 1);

        assert!(cart.set_quantity(ProductId::new(1), 0));
        assert_eq!(cart.lines().len(), 1);
        assert!(!cart.set_quantity(ProductId::new(9), 2));
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 1);
        cart.add(item(2, 100), 1);

        assert!(cart.remove(ProductId::new(2)));
        assert!(!cart.remove(ProductId::new(2)));
        assert_eq!(cart.item_count(), 1);

        cart.clear();
        assert!(cart.is_empty());
        assert_eq!(cart.subtotal(), Price::ZERO);
    }

    #[test]
    fn test_vendor_ids_are_distinct_in_first_seen_order() {
        let mut cart = Cart::new();
        cart.add(item(1, 100), 1);
        cart.add(item(2, 100), 1);
        cart.add(item(3, 100), 1);

        assert_eq!(cart.vendor_ids(), vec![VendorId::new(1), VendorId::new(0)]);
    }

    #[test]
    fn test_cart_survives_serialization() {
        let mut cart = Cart::new();
        cart.add(item(1, 2_990), 2);

        let json = serde_json::to_string(&cart).unwrap();
        assert!(json.contains("\"product_id\":1"));
        assert!(json.contains("\"quantity\":2"));

        let restored: Cart = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, cart);
    }
}
