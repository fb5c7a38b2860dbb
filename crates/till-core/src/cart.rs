//! # Cart Engine
//!
//! Builds a mutable line-item collection from catalog products, enforces
//! stock ceilings, and computes checkout totals.
//!
//! ## Cart Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Scan Product ─────► add_line() ────────► merge or push line        │
//! │  Change Quantity ──► update_quantity() ─► delta against ceiling     │
//! │  Remove Line ──────► remove_line() ─────► explicit removal          │
//! │  Tender Screen ────► totals() ──────────► subtotal/discount/tax     │
//! │                                                                     │
//! │  Stock ceiling: a line can never exceed the product's stock as      │
//! │  snapshotted at add time. Violations are rejected, not clamped.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::types::{DiscountSpec, Product};
use crate::validation::validate_quantity;
use crate::{MAX_CART_LINES, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// A line in the cart: a product snapshot plus quantity.
///
/// The snapshot freezes price, cost and stock ceiling at add time, so the
/// cart stays consistent even if the catalog changes underneath it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLine {
    /// Product ID (UUID), for catalog lookup at commit time.
    pub product_id: String,

    /// Product name at time of adding (frozen).
    pub name: String,

    /// Category at time of adding (frozen).
    pub category: String,

    /// Unit price in cents at time of adding (frozen).
    pub unit_price_cents: i64,

    /// Unit cost in cents at time of adding (frozen, for COGS).
    pub unit_cost_cents: i64,

    /// Stock level at time of adding — the quantity ceiling for this line.
    pub stock_at_add: i64,

    /// Quantity in cart. Invariant: 1..=stock_at_add.
    pub quantity: i64,

    /// When this line was added.
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    /// Creates a cart line from a product and quantity.
    pub fn from_product(product: &Product, quantity: i64) -> Self {
        CartLine {
            product_id: product.id.clone(),
            name: product.name.clone(),
            category: product.category.clone(),
            unit_price_cents: product.price_cents,
            unit_cost_cents: product.cost_cents,
            stock_at_add: product.stock,
            quantity,
            added_at: Utc::now(),
        }
    }

    /// Line total (unit price × quantity) in cents.
    #[inline]
    pub fn line_total_cents(&self) -> i64 {
        self.unit_price_cents * self.quantity
    }

    /// Line total as Money.
    #[inline]
    pub fn line_total(&self) -> Money {
        Money::from_cents(self.line_total_cents())
    }
}

// =============================================================================
// Cart Totals
// =============================================================================

/// Totals computed for a cart at a given discount and tax rate.
///
/// Discount is clamped to `[0, subtotal]`; tax applies to the net
/// (`subtotal - discount`), rounded once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl CartTotals {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Cart
// =============================================================================

/// The cart under construction at the register.
///
/// ## Invariants
/// - Lines are unique by `product_id` (adding the same product merges)
/// - Quantity is 1..=stock ceiling; violations are rejected with
///   `InsufficientStock`, never silently clamped
/// - At most MAX_CART_LINES lines, MAX_LINE_QUANTITY per line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    /// Lines in the cart, in add order.
    pub lines: Vec<CartLine>,

    /// When the cart was created/last cleared.
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart.
    pub fn new() -> Self {
        Cart {
            lines: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// Adds a product to the cart, or increases quantity if already present.
    ///
    /// Fails with `InsufficientStock` when the combined quantity would
    /// exceed the product's stock ceiling; the cart is left unchanged.
    pub fn add_line(&mut self, product: &Product, quantity: i64) -> CoreResult<()> {
        validate_quantity(quantity)?;

        if let Some(line) = self.lines.iter_mut().find(|l| l.product_id == product.id) {
            let requested = line.quantity + quantity;
            if requested > MAX_LINE_QUANTITY {
                return Err(CoreError::QuantityTooLarge {
                    requested,
                    max: MAX_LINE_QUANTITY,
                });
            }
            if requested > line.stock_at_add {
                return Err(CoreError::InsufficientStock {
                    name: line.name.clone(),
                    available: line.stock_at_add,
                    requested,
                });
            }
            line.quantity = requested;
            return Ok(());
        }

        if self.lines.len() >= MAX_CART_LINES {
            return Err(CoreError::CartTooLarge {
                max: MAX_CART_LINES,
            });
        }

        if quantity > product.stock {
            return Err(CoreError::InsufficientStock {
                name: product.name.clone(),
                available: product.stock,
                requested: quantity,
            });
        }

        self.lines.push(CartLine::from_product(product, quantity));
        Ok(())
    }

    /// Adjusts a line's quantity by a signed delta.
    ///
    /// ## Behavior
    /// - Past the stock ceiling: fails `InsufficientStock`, quantity unchanged
    /// - Delta that would drop the quantity below 1: the line is left
    ///   unchanged — removal is a separate explicit operation
    /// - Product not in cart: fails `ProductNotFound`
    pub fn update_quantity(&mut self, product_id: &str, delta: i64) -> CoreResult<()> {
        let line = self
            .lines
            .iter_mut()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::ProductNotFound(product_id.to_string()))?;

        let requested = line.quantity + delta;
        if requested < 1 {
            // Not an error: going to zero must be an explicit remove_line
            return Ok(());
        }
        if requested > MAX_LINE_QUANTITY {
            return Err(CoreError::QuantityTooLarge {
                requested,
                max: MAX_LINE_QUANTITY,
            });
        }
        if requested > line.stock_at_add {
            return Err(CoreError::InsufficientStock {
                name: line.name.clone(),
                available: line.stock_at_add,
                requested,
            });
        }

        line.quantity = requested;
        Ok(())
    }

    /// Removes a line from the cart by product ID.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.lines.len();
        self.lines.retain(|l| l.product_id != product_id);

        if self.lines.len() == initial_len {
            Err(CoreError::ProductNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Clears all lines from the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.created_at = Utc::now();
    }

    /// Number of unique lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total quantity across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    /// Subtotal (before discount and tax) in cents.
    pub fn subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents()).sum()
    }

    /// Checks if the cart is empty.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Computes subtotal, clamped discount, tax-on-net and grand total.
    ///
    /// ## Example
    /// ```rust
    /// use till_core::cart::Cart;
    /// use till_core::money::TaxRate;
    /// use till_core::types::DiscountSpec;
    /// # use till_core::types::Product;
    /// # use chrono::Utc;
    /// # let now = Utc::now();
    /// # let product = Product {
    /// #     id: "p1".into(), name: "Widget".into(), category: "Misc".into(),
    /// #     barcode: None, price_cents: 1000, cost_cents: 400, stock: 10,
    /// #     is_active: true, created_at: now, updated_at: now,
    /// # };
    ///
    /// let mut cart = Cart::new();
    /// cart.add_line(&product, 3).unwrap();
    ///
    /// let totals = cart.totals(Some(DiscountSpec::Fixed(500)), TaxRate::from_bps(1000));
    /// assert_eq!(totals.subtotal_cents, 3000);
    /// assert_eq!(totals.discount_cents, 500);
    /// assert_eq!(totals.tax_cents, 250);
    /// assert_eq!(totals.total_cents, 2750);
    /// ```
    pub fn totals(&self, discount: Option<DiscountSpec>, tax_rate: TaxRate) -> CartTotals {
        let subtotal = Money::from_cents(self.subtotal_cents());
        let discount_amount = discount
            .map(|d| d.amount_for(subtotal))
            .unwrap_or(Money::zero());
        let net = subtotal - discount_amount;
        let tax = net.tax_at(tax_rate);
        let total = net + tax;

        CartTotals {
            subtotal_cents: subtotal.cents(),
            discount_cents: discount_amount.cents(),
            tax_cents: tax.cents(),
            total_cents: total.cents(),
        }
    }
}

impl Default for Cart {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn test_product(id: &str, price_cents: i64, stock: i64) -> Product {
        let now = Utc::now();
        Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            category: "General".to_string(),
            barcode: None,
            price_cents,
            cost_cents: price_cents / 2,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_add_line() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 10);

        cart.add_line(&product, 2).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 2);
        assert_eq!(cart.subtotal_cents(), 1998);
    }

    #[test]
    fn test_add_same_product_merges() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 10);

        cart.add_line(&product, 2).unwrap();
        cart.add_line(&product, 3).unwrap();

        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.total_quantity(), 5);
    }

    #[test]
    fn test_add_beyond_stock_rejected() {
        let mut cart = Cart::new();
        let product = test_product("1", 999, 2);

        cart.add_line(&product, 2).unwrap();

        // 2 in cart + 1 more exceeds stock of 2
        let err = cart.add_line(&product, 1).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_update_quantity_beyond_stock_rejected() {
        let mut cart = Cart::new();
        let product = test_product("x", 1000, 2);

        cart.add_line(&product, 2).unwrap();

        let err = cart.update_quantity("x", 1).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { .. }));
        // Cart remains at qty 2
        assert_eq!(cart.lines[0].quantity, 2);
    }

    #[test]
    fn test_update_quantity_never_drops_below_one() {
        let mut cart = Cart::new();
        let product = test_product("1", 500, 10);

        cart.add_line(&product, 1).unwrap();
        cart.update_quantity("1", -1).unwrap();

        // Unchanged: removal is explicit
        assert_eq!(cart.lines[0].quantity, 1);

        cart.update_quantity("1", 3).unwrap();
        assert_eq!(cart.lines[0].quantity, 4);
        cart.update_quantity("1", -2).unwrap();
        assert_eq!(cart.lines[0].quantity, 2);
    }

    #[test]
    fn test_update_quantity_unknown_product() {
        let mut cart = Cart::new();
        let err = cart.update_quantity("nope", 1).unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_remove_line() {
        let mut cart = Cart::new();
        let product = test_product("1", 500, 10);

        cart.add_line(&product, 2).unwrap();
        cart.remove_line("1").unwrap();
        assert!(cart.is_empty());

        let err = cart.remove_line("1").unwrap_err();
        assert!(matches!(err, CoreError::ProductNotFound(_)));
    }

    #[test]
    fn test_totals_fixed_discount_tax_on_net() {
        // One line {10.00 × 3}, fixed 5.00 discount, 10% tax
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 10);
        cart.add_line(&product, 3).unwrap();

        let totals = cart.totals(Some(DiscountSpec::Fixed(500)), TaxRate::from_bps(1000));

        assert_eq!(totals.subtotal_cents, 3000);
        assert_eq!(totals.discount_cents, 500);
        assert_eq!(totals.tax_cents, 250);
        assert_eq!(totals.total_cents, 2750);
    }

    #[test]
    fn test_totals_discount_clamped() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 10);
        cart.add_line(&product, 1).unwrap();

        let totals = cart.totals(Some(DiscountSpec::Fixed(9999)), TaxRate::from_bps(1000));

        assert_eq!(totals.discount_cents, 1000);
        assert_eq!(totals.tax_cents, 0);
        assert_eq!(totals.total_cents, 0);
    }

    #[test]
    fn test_totals_percent_discount() {
        let mut cart = Cart::new();
        let product = test_product("1", 2000, 10);
        cart.add_line(&product, 1).unwrap();

        // 25% of 20.00 = 5.00; tax 10% on 15.00 = 1.50
        let totals = cart.totals(Some(DiscountSpec::Percent(2500)), TaxRate::from_bps(1000));

        assert_eq!(totals.discount_cents, 500);
        assert_eq!(totals.tax_cents, 150);
        assert_eq!(totals.total_cents, 1650);
    }

    #[test]
    fn test_totals_no_discount() {
        let mut cart = Cart::new();
        let product = test_product("1", 1000, 10);
        cart.add_line(&product, 1).unwrap();

        let totals = cart.totals(None, TaxRate::from_bps(825));

        assert_eq!(totals.discount_cents, 0);
        // 10.00 at 8.25% → 0.83
        assert_eq!(totals.tax_cents, 83);
        assert_eq!(totals.total_cents, 1083);
    }

    #[test]
    fn test_price_frozen_at_add_time() {
        let mut cart = Cart::new();
        let mut product = test_product("1", 1000, 10);
        cart.add_line(&product, 1).unwrap();

        // Catalog price change after adding must not affect the cart
        product.price_cents = 9999;
        assert_eq!(cart.subtotal_cents(), 1000);
    }
}
