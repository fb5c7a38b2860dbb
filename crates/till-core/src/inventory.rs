//! # Inventory & Loyalty Updater
//!
//! Applies a committed transaction's line items against stock levels and
//! customer accumulators.
//!
//! Pure function discipline: every mutation is expressed as
//! (old state, delta) → new state. Nothing here touches storage; the
//! caller persists the returned values, and the caller alone guarantees
//! at-most-once invocation per committed transaction.

use serde::{Deserialize, Serialize};

use crate::money::LoyaltyRate;
use crate::transaction::Transaction;
use crate::types::{Customer, Product, TransactionKind};

/// Result of applying a transaction to catalog + customer state.
///
/// `missing_products` lists line product ids that no longer exist in the
/// catalog — non-fatal: those lines are skipped and surfaced for the
/// caller to log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppliedTransaction {
    pub updated_products: Vec<Product>,
    pub updated_customer: Option<Customer>,
    pub missing_products: Vec<String>,
}

/// Applies a committed transaction.
///
/// For each line, the matching product's stock is decremented by the
/// quantity (sales) or incremented (returns — goods go back on the
/// shelf). Decrements clamp at zero: the catalog invariant is
/// `stock >= 0` even when the catalog changed between cart-build and
/// commit. A missing product skips that line only.
///
/// With a customer attached and kind = Sale: `total_spent` grows by the
/// transaction total, `visit_count` by one, and `points` by
/// `floor(total * loyalty_rate)`. Returns accrue nothing and claw
/// nothing back.
pub fn apply_transaction(
    transaction: &Transaction,
    catalog: &[Product],
    customer: Option<&Customer>,
    loyalty_rate: LoyaltyRate,
) -> AppliedTransaction {
    let mut updated_products = Vec::new();
    let mut missing_products = Vec::new();

    for line in &transaction.lines {
        let Some(product) = catalog.iter().find(|p| p.id == line.product_id) else {
            missing_products.push(line.product_id.clone());
            continue;
        };

        let mut updated = product.clone();
        updated.stock = match transaction.kind {
            TransactionKind::Sale => (product.stock - line.quantity).max(0),
            TransactionKind::Return => product.stock + line.quantity,
        };
        updated_products.push(updated);
    }

    let updated_customer = match (customer, transaction.kind) {
        (Some(customer), TransactionKind::Sale) => {
            let mut updated = customer.clone();
            updated.total_spent_cents += transaction.total_cents;
            updated.visit_count += 1;
            updated.points += loyalty_rate.points_for(transaction.total());
            Some(updated)
        }
        _ => None,
    };

    AppliedTransaction {
        updated_products,
        updated_customer,
        missing_products,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::money::TaxRate;
    use crate::transaction::{build_return, build_sale, TenderedAmounts};
    use crate::types::{RegisterSettings, TenderType};
    use chrono::Utc;

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

    fn test_customer() -> Customer {
        let now = Utc::now();
        Customer {
            id: "c1".to_string(),
            name: "Regular".to_string(),
            phone: None,
            total_spent_cents: 1000,
            visit_count: 3,
            points: 10,
            created_at: now,
            updated_at: now,
        }
    }

    fn sale_of(catalog: &[Product], qty: i64) -> Transaction {
        let mut cart = Cart::new();
        cart.add_line(&catalog[0], qty).unwrap();
        let settings = RegisterSettings {
            tax_rate: TaxRate::from_bps(1000),
            ..RegisterSettings::default()
        };
        build_sale(
            &cart,
            None,
            TenderType::Cash,
            TenderedAmounts::primary(1_000_000),
            &settings,
            Some("c1".to_string()),
            "op-1",
        )
        .unwrap()
    }

    #[test]
    fn test_sale_decrements_stock() {
        let catalog = vec![test_product("a", 1000, 10)];
        let tx = sale_of(&catalog, 3);

        let applied = apply_transaction(&tx, &catalog, None, LoyaltyRate::zero());

        assert_eq!(applied.updated_products.len(), 1);
        assert_eq!(applied.updated_products[0].stock, 7);
        assert!(applied.missing_products.is_empty());
    }

    #[test]
    fn test_sale_stock_clamps_at_zero() {
        let mut catalog = vec![test_product("a", 1000, 10)];
        let tx = sale_of(&catalog, 3);

        // Catalog changed between cart-build and commit
        catalog[0].stock = 2;
        let applied = apply_transaction(&tx, &catalog, None, LoyaltyRate::zero());
        assert_eq!(applied.updated_products[0].stock, 0);
    }

    #[test]
    fn test_missing_product_skipped_non_fatal() {
        let catalog = vec![test_product("a", 1000, 10)];
        let tx = sale_of(&catalog, 1);

        let applied = apply_transaction(&tx, &[], None, LoyaltyRate::zero());

        assert!(applied.updated_products.is_empty());
        assert_eq!(applied.missing_products, vec!["a".to_string()]);
    }

    #[test]
    fn test_customer_accrual_on_sale() {
        let catalog = vec![test_product("a", 1000, 10)];
        let tx = sale_of(&catalog, 3); // total 33.00
        let customer = test_customer();

        let applied = apply_transaction(
            &tx,
            &catalog,
            Some(&customer),
            LoyaltyRate::from_scaled(10_000),
        );

        let updated = applied.updated_customer.unwrap();
        assert_eq!(updated.total_spent_cents, 1000 + 3300);
        assert_eq!(updated.visit_count, 4);
        assert_eq!(updated.points, 10 + 33);
    }

    #[test]
    fn test_return_restocks_and_skips_loyalty() {
        let catalog = vec![test_product("a", 1000, 10)];
        let sale = sale_of(&catalog, 3);
        let ret = build_return(&sale, &[("a", 2)], "op-1").unwrap();
        let customer = test_customer();

        let applied = apply_transaction(
            &ret,
            &catalog,
            Some(&customer),
            LoyaltyRate::from_scaled(10_000),
        );

        // Goods go back on the shelf
        assert_eq!(applied.updated_products[0].stock, 12);
        // No loyalty clawback, no accrual
        assert!(applied.updated_customer.is_none());
    }
}
