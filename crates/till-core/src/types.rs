//! # Domain Types
//!
//! Core domain types used throughout Till POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  ┌──────────────┐   ┌──────────────┐   ┌──────────────┐             │
//! │  │   Product    │   │   Customer   │   │   Expense    │             │
//! │  │  ──────────  │   │  ──────────  │   │  ──────────  │             │
//! │  │  id (UUID)   │   │  id (UUID)   │   │  id (UUID)   │             │
//! │  │  price_cents │   │  total_spent │   │  amount_cents│             │
//! │  │  cost_cents  │   │  points      │   │  incurred_at │             │
//! │  │  stock       │   │  visit_count │   └──────────────┘             │
//! │  └──────────────┘   └──────────────┘                                │
//! │                                                                     │
//! │  ┌──────────────┐   ┌──────────────────┐   ┌──────────────┐         │
//! │  │  TenderType  │   │ TransactionKind  │   │ DiscountSpec │         │
//! │  │  Cash        │   │  Sale            │   │  Fixed(¢)    │         │
//! │  │  Card        │   │  Return          │   │  Percent(bps)│         │
//! │  │  Digital     │   └──────────────────┘   └──────────────┘         │
//! │  └──────────────┘                                                   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Monetary fields are stored as `*_cents: i64` with [`Money`] accessors,
//! so the same structs map directly onto database rows.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::money::{ExchangeRate, LoyaltyRate, Money, TaxRate};

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name shown to the operator and on the receipt.
    pub name: String,

    /// Category used for report breakdowns.
    pub category: String,

    /// Barcode (EAN-13, UPC-A, ...). Unique when present.
    pub barcode: Option<String>,

    /// Unit price in cents.
    pub price_cents: i64,

    /// Unit cost in cents (for COGS and margin reporting).
    pub cost_cents: i64,

    /// Current stock level. Invariant: never negative.
    pub stock: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the unit cost as Money.
    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_cents(self.cost_cents)
    }

    /// Checks whether `quantity` units can be sold from current stock.
    #[inline]
    pub fn in_stock(&self, quantity: i64) -> bool {
        self.stock >= quantity
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A loyalty customer.
///
/// The accumulators (total_spent_cents, visit_count, points) are updated
/// by committed sale transactions only, and only additively.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: String,
    pub name: String,
    pub phone: Option<String>,

    /// Lifetime spend in cents.
    pub total_spent_cents: i64,

    /// Number of committed sales attributed to this customer.
    pub visit_count: i64,

    /// Accrued loyalty points.
    pub points: i64,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns lifetime spend as Money.
    #[inline]
    pub fn total_spent(&self) -> Money {
        Money::from_cents(self.total_spent_cents)
    }
}

// =============================================================================
// Expense
// =============================================================================

/// A recorded business expense, subtracted from gross profit in reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Expense {
    pub id: String,
    pub description: String,
    pub amount_cents: i64,
    pub incurred_at: DateTime<Utc>,
}

impl Expense {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Tender Type
// =============================================================================

/// The payment channel of a single transaction. Closed enum: a
/// transaction has exactly one tender, never a split.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TenderType {
    /// Physical cash in the drawer.
    Cash,
    /// Card payment on an external terminal.
    Card,
    /// Digital wallet / QR payment.
    Digital,
}

// =============================================================================
// Transaction Kind
// =============================================================================

/// Whether a transaction records a sale or a return.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Sale,
    Return,
}

// =============================================================================
// Discount Spec
// =============================================================================

/// A whole-cart discount: a fixed amount or a percentage of subtotal.
///
/// The resulting amount is always clamped to `[0, subtotal]` — never
/// negative, never exceeding the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", tag = "kind", content = "value")]
pub enum DiscountSpec {
    /// Fixed amount in cents.
    Fixed(i64),
    /// Percentage of subtotal in basis points (1000 = 10%).
    Percent(u32),
}

impl DiscountSpec {
    /// Computes the discount amount for a given subtotal, clamped to
    /// `[0, subtotal]`. Percentage rounding is half-up, applied once.
    pub fn amount_for(&self, subtotal: Money) -> Money {
        let raw = match *self {
            DiscountSpec::Fixed(cents) => Money::from_cents(cents),
            DiscountSpec::Percent(bps) => {
                let cents = (subtotal.cents() as i128 * bps as i128 + 5000) / 10_000;
                Money::from_cents(cents as i64)
            }
        };

        if raw.is_negative() {
            Money::zero()
        } else if raw > subtotal {
            subtotal
        } else {
            raw
        }
    }
}

// =============================================================================
// Register Settings
// =============================================================================

/// A secondary tender currency accepted at the register.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecondaryCurrency {
    /// ISO-style code, e.g. "EUR".
    pub code: String,
    /// Secondary units per primary major unit.
    pub exchange_rate: ExchangeRate,
}

/// Register configuration: currency, tax and loyalty rates.
///
/// Persistence of settings is the caller's concern; the core only reads
/// them when computing totals, change and loyalty accrual.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterSettings {
    /// Store name printed on receipts.
    pub store_name: String,

    /// Primary currency code, e.g. "USD".
    pub currency_code: String,

    /// Symbol used when rendering receipts, e.g. "$".
    pub currency_symbol: String,

    /// Optional secondary tender currency.
    pub secondary: Option<SecondaryCurrency>,

    /// Flat tax rate applied to the discounted subtotal.
    pub tax_rate: TaxRate,

    /// Loyalty accrual rate.
    pub loyalty_rate: LoyaltyRate,
}

impl Default for RegisterSettings {
    fn default() -> Self {
        RegisterSettings {
            store_name: "Till POS".to_string(),
            currency_code: "USD".to_string(),
            currency_symbol: "$".to_string(),
            secondary: None,
            tax_rate: TaxRate::zero(),
            loyalty_rate: LoyaltyRate::zero(),
        }
    }
}

impl RegisterSettings {
    /// Returns the secondary exchange rate, or zero when no secondary
    /// currency is configured.
    pub fn exchange_rate(&self) -> ExchangeRate {
        self.secondary
            .as_ref()
            .map(|s| s.exchange_rate)
            .unwrap_or(ExchangeRate::from_scaled(0))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discount_fixed_clamped_to_subtotal() {
        let subtotal = Money::from_cents(3000);

        assert_eq!(
            DiscountSpec::Fixed(500).amount_for(subtotal).cents(),
            500
        );
        // Larger than subtotal → clamped
        assert_eq!(
            DiscountSpec::Fixed(5000).amount_for(subtotal).cents(),
            3000
        );
        // Negative → zero
        assert_eq!(DiscountSpec::Fixed(-100).amount_for(subtotal).cents(), 0);
    }

    #[test]
    fn test_discount_percent() {
        let subtotal = Money::from_cents(3000);

        // 10% of 30.00 = 3.00
        assert_eq!(
            DiscountSpec::Percent(1000).amount_for(subtotal).cents(),
            300
        );
        // 100% caps at subtotal
        assert_eq!(
            DiscountSpec::Percent(10_000).amount_for(subtotal).cents(),
            3000
        );
        // Over 100% still clamped
        assert_eq!(
            DiscountSpec::Percent(20_000).amount_for(subtotal).cents(),
            3000
        );
    }

    #[test]
    fn test_product_in_stock() {
        let now = Utc::now();
        let product = Product {
            id: "p1".to_string(),
            name: "Cola".to_string(),
            category: "Beverages".to_string(),
            barcode: None,
            price_cents: 250,
            cost_cents: 100,
            stock: 2,
            is_active: true,
            created_at: now,
            updated_at: now,
        };

        assert!(product.in_stock(2));
        assert!(!product.in_stock(3));
    }

    #[test]
    fn test_settings_exchange_rate_defaults_to_zero() {
        let settings = RegisterSettings::default();
        assert!(settings.exchange_rate().is_zero());
    }

    #[test]
    fn test_settings_json_round_trip() {
        let settings = RegisterSettings {
            secondary: Some(SecondaryCurrency {
                code: "EUR".to_string(),
                exchange_rate: ExchangeRate::from_scaled(45_000),
            }),
            tax_rate: TaxRate::from_bps(825),
            loyalty_rate: LoyaltyRate::from_scaled(10_000),
            ..RegisterSettings::default()
        };

        let json = serde_json::to_string(&settings).unwrap();
        let decoded: RegisterSettings = serde_json::from_str(&json).unwrap();

        assert_eq!(decoded.tax_rate, settings.tax_rate);
        assert_eq!(
            decoded.secondary.unwrap().exchange_rate,
            ExchangeRate::from_scaled(45_000)
        );
    }
}
