//! # Cart Module
//!
//! In-memory bill composition. A cart exists only while a bill is being
//! put together; abandoning it has no persisted side effects. On checkout
//! the sale engine folds it into a `Transaction` (and a `CustomerDue` for
//! udhaar sales).
//!
//! ## Invariants
//! - Lines are unique by `product_id` (adding the same product again
//!   increases quantity)
//! - Quantity is always >= 1; setting it to 0 removes the line
//! - A line discount never exceeds the line subtotal
//! - At most [`crate::MAX_CART_ITEMS`] lines, [`crate::MAX_ITEM_QUANTITY`]
//!   per line

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, ValidationResult};
use crate::money::Money;
use crate::types::{Product, TransactionItem};
use crate::validation;

/// One line on the bill being composed.
///
/// Product data is frozen at the moment of adding: a price edit in the
/// inventory never changes a bill already on the counter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    /// Product ID (UUID), for the stock decrement at checkout.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Selling price in paise at time of adding (frozen).
    pub unit_price_paise: i64,

    /// GST rate at time of adding (frozen), display only.
    pub gst_bps: Option<u32>,

    /// Quantity on this line, always >= 1.
    pub quantity: i64,

    /// Flat discount on this line, 0 <= discount <= line subtotal.
    pub discount_paise: i64,

    /// When this line was added.
    pub added_at: DateTime<Utc>,
}

impl CartItem {
    /// Creates a cart line from a product snapshot and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartItem {
            product_id: product.id.clone(),
            name: product.name.clone(),
            unit_price_paise: product.selling_price_paise,
            gst_bps: product.gst_bps,
            quantity,
            discount_paise: 0,
            added_at: Utc::now(),
        }
    }

    /// Line subtotal before discount (unit price × quantity).
    #[inline]
    pub fn subtotal_paise(&self) -> i64 {
        self.unit_price_paise * self.quantity
    }

    /// Line total after discount.
    #[inline]
    pub fn total_paise(&self) -> i64 {
        self.subtotal_paise() - self.discount_paise
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise())
    }

    /// Freezes this line into a transaction item snapshot.
    pub fn to_snapshot(&self) -> TransactionItem {
        TransactionItem {
            product_id: self.product_id.clone(),
            name: self.name.clone(),
            quantity: self.quantity,
            unit_price_paise: self.unit_price_paise,
            discount_paise: self.discount_paise,
            line_total_paise: self.total_paise(),
        }
    }
}

/// The bill under composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<CartItem>,

    /// When the cart was created or last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            items: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart, merging with an existing line for the
    /// same product.
    pub fn add_item(&mut self, product: &Product, quantity: i64) -> ValidationResult<()> {
        validation::validate_quantity(quantity)?;

        if let Some(item) = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product.id)
        {
            let new_qty = item.quantity + quantity;
            validation::validate_quantity(new_qty)?;
            item.quantity = new_qty;
            return Ok(());
        }

        validation::validate_cart_size(self.items.len())?;
        self.items.push(CartItem::from_product(product, quantity));
        Ok(())
    }

    /// Sets the quantity of a line. Zero removes the line.
    pub fn update_quantity(&mut self, product_id: &str, quantity: i64) -> ValidationResult<()> {
        if quantity == 0 {
            return self.remove_item(product_id);
        }

        validation::validate_quantity(quantity)?;

        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| ValidationError::Required {
                field: format!("cart line for product {product_id}"),
            })?;

        item.quantity = quantity;
        // A shrunk line can no longer carry a discount larger than itself.
        validation::validate_discount(item.discount_paise, item.subtotal_paise())?;
        Ok(())
    }

    /// Sets the flat discount on a line.
    pub fn set_discount(&mut self, product_id: &str, discount_paise: i64) -> ValidationResult<()> {
        let item = self
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or_else(|| ValidationError::Required {
                field: format!("cart line for product {product_id}"),
            })?;

        validation::validate_discount(discount_paise, item.subtotal_paise())?;
        item.discount_paise = discount_paise;
        Ok(())
    }

    /// Removes a line by product ID.
    pub fn remove_item(&mut self, product_id: &str) -> ValidationResult<()> {
        let before = self.items.len();
        self.items.retain(|i| i.product_id != product_id);

        if self.items.len() == before {
            Err(ValidationError::Required {
                field: format!("cart line for product {product_id}"),
            })
        } else {
            Ok(())
        }
    }

    /// Clears the cart (abandoning the bill).
    pub fn clear(&mut self) {
        self.items.clear();
        self.created_at = Utc::now();
    }

    /// Number of unique lines.
    #[inline]
    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items.iter().map(|i| i.quantity).sum()
    }

    /// Bill total: Σ(price × quantity − discount) over all lines.
    pub fn total_paise(&self) -> i64 {
        self.items.iter().map(|i| i.total_paise()).sum()
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise())
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Freezes every line into transaction item snapshots.
    pub fn snapshot(&self) -> Vec<TransactionItem> {
        self.items.iter().map(CartItem::to_snapshot).collect()
    }
}

impl Default for Cart {
    fn default() -> Self {
        Cart::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_MERCHANT_ID;

    fn test_product(id: &str, price_paise: i64) -> Product {
        Product {
            id: id.to_string(),
            merchant_id: DEFAULT_MERCHANT_ID.to_string(),
            name: format!("Product {id}"),
            cost_price_paise: price_paise / 2,
            selling_price_paise: price_paise,
            stock: 50,
            category: "Staples".to_string(),
            gst_bps: None,
            barcode: None,
            image_ref: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_add_item() {
        let mut cart = Cart::new();
        let product = test_product("p1", 14500);

        cart.add_item(&product, 2).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.total_paise(), 29000);
    }

    #[test]
    fn test_add_same_product_merges_lines() {
        let mut cart = Cart::new();
        let product = test_product("p1", 1400);

        cart.add_item(&product, 2).unwrap();
        cart.add_item(&product, 3).unwrap();

        assert_eq!(cart.item_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_line_discount_reduces_total() {
        let mut cart = Cart::new();
        let product = test_product("p1", 10000);

        cart.add_item(&product, 2).unwrap();
        cart.set_discount("p1", 500).unwrap();

        // 2 × 100.00 − 5.00 = 195.00
        assert_eq!(cart.total_paise(), 19500);
    }

    #[test]
    fn test_discount_cannot_exceed_subtotal() {
        let mut cart = Cart::new();
        let product = test_product("p1", 1000);

        cart.add_item(&product, 1).unwrap();
        let err = cart.set_discount("p1", 1500).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::DiscountExceedsSubtotal { .. }
        ));
    }

    #[test]
    fn test_update_quantity_zero_removes_line() {
        let mut cart = Cart::new();
        let product = test_product("p1", 1000);

        cart.add_item(&product, 2).unwrap();
        cart.update_quantity("p1", 0).unwrap();

        assert!(cart.is_empty());
    }

    #[test]
    fn test_shrinking_line_revalidates_discount() {
        let mut cart = Cart::new();
        let product = test_product("p1", 1000);

        cart.add_item(&product, 3).unwrap();
        cart.set_discount("p1", 2500).unwrap();

        // 1 × 10.00 subtotal cannot carry a 25.00 discount
        assert!(cart.update_quantity("p1", 1).is_err());
    }

    #[test]
    fn test_clear() {
        let mut cart = Cart::new();
        let product = test_product("p1", 1000);

        cart.add_item(&product, 2).unwrap();
        assert!(!cart.is_empty());

        cart.clear();
        assert!(cart.is_empty());
    }

    #[test]
    fn test_snapshot_freezes_lines() {
        let mut cart = Cart::new();
        let product = test_product("p1", 10000);

        cart.add_item(&product, 2).unwrap();
        cart.set_discount("p1", 1000).unwrap();

        let snapshot = cart.snapshot();
        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot[0].quantity, 2);
        assert_eq!(snapshot[0].line_total_paise, 19000);
    }
}
