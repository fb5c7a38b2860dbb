//! # Transaction Builder
//!
//! Freezes a cart plus payment/customer context into an immutable
//! transaction record.
//!
//! ## Checkout Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Cart ──► build_sale() ──► Transaction (frozen)                     │
//! │                                │                                    │
//! │                                ▼                                    │
//! │            caller commits: persist → shift totals → stock/loyalty   │
//! │                                                                     │
//! │  Building has NO side effects. Validation (cash sufficiency, dual-  │
//! │  currency conversion) happens here; committing is the caller's      │
//! │  separate responsibility, which keeps the builder pure.             │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A transaction is never mutated after it is built. Returns are new
//! transactions of kind `Return` linked to the original.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::cart::{Cart, CartLine};
use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{DiscountSpec, RegisterSettings, TenderType, TransactionKind};
use crate::validation::validate_operator_id;
use crate::CASH_EPSILON_CENTS;

// =============================================================================
// Transaction Line
// =============================================================================

/// A frozen line item. Later catalog changes never retroactively alter
/// historical transactions.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct TransactionLine {
    pub product_id: String,
    /// Product name at time of sale (frozen).
    pub name: String,
    /// Category at time of sale (frozen).
    pub category: String,
    /// Unit price in cents at time of sale (frozen).
    pub unit_price_cents: i64,
    /// Unit cost in cents at time of sale (frozen, for COGS).
    pub unit_cost_cents: i64,
    pub quantity: i64,
    /// Line total before discount/tax (unit_price × quantity).
    pub line_total_cents: i64,
}

impl From<&CartLine> for TransactionLine {
    fn from(line: &CartLine) -> Self {
        TransactionLine {
            product_id: line.product_id.clone(),
            name: line.name.clone(),
            category: line.category.clone(),
            unit_price_cents: line.unit_price_cents,
            unit_cost_cents: line.unit_cost_cents,
            quantity: line.quantity,
            line_total_cents: line.line_total_cents(),
        }
    }
}

// =============================================================================
// Tendered Amounts
// =============================================================================

/// Cash handed over at the register, possibly across two currencies.
///
/// The secondary amount is converted to primary via the configured
/// exchange rate before sufficiency is checked.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct TenderedAmounts {
    /// Amount tendered in the primary currency, in cents.
    pub primary_cents: i64,
    /// Amount tendered in the secondary currency, in cents.
    pub secondary_cents: i64,
}

impl TenderedAmounts {
    /// Primary-only tender.
    pub fn primary(cents: i64) -> Self {
        TenderedAmounts {
            primary_cents: cents,
            secondary_cents: 0,
        }
    }
}

/// Change due back to the customer, expressed in both currencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeDue {
    pub primary_cents: i64,
    pub secondary_cents: i64,
}

// =============================================================================
// Transaction
// =============================================================================

/// An immutable transaction record, created once at checkout commit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Date-derived receipt number, orderable for display.
    pub receipt_number: String,

    pub kind: TransactionKind,

    /// Frozen line items, in cart order.
    pub lines: Vec<TransactionLine>,

    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,

    pub tender: TenderType,

    /// Total tendered, converted to primary cents.
    pub tendered_cents: i64,

    /// Change due in primary cents.
    pub change_cents: i64,

    /// Change due expressed in secondary cents (0 when no secondary
    /// currency is configured).
    pub change_secondary_cents: i64,

    /// Customer this sale is attributed to, if any.
    pub customer_id: Option<String>,

    /// For returns: the transaction being returned against.
    pub original_transaction_id: Option<String>,

    pub operator_id: String,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// Total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    /// Change due in both currencies.
    #[inline]
    pub fn change_due(&self) -> ChangeDue {
        ChangeDue {
            primary_cents: self.change_cents,
            secondary_cents: self.change_secondary_cents,
        }
    }

    /// Re-derives the subtotal from the frozen lines.
    ///
    /// For any committed transaction this equals `subtotal_cents`; the
    /// frozen snapshot is the source of truth, not the live catalog.
    pub fn derived_subtotal_cents(&self) -> i64 {
        self.lines.iter().map(|l| l.line_total_cents).sum()
    }

    /// Is this a sale (vs a return)?
    #[inline]
    pub fn is_sale(&self) -> bool {
        self.kind == TransactionKind::Sale
    }
}

// =============================================================================
// Builders
// =============================================================================

/// Freezes a cart into a sale transaction.
///
/// For cash tenders the total paid is
/// `primary + secondary / exchange_rate`; the build fails with
/// `PaymentInsufficient` when that falls short of the total by more than
/// one cent. Card and digital tenders are charged exact.
///
/// Building returns the record and nothing else — persisting it and
/// applying stock/shift/loyalty effects is the caller's job.
pub fn build_sale(
    cart: &Cart,
    discount: Option<DiscountSpec>,
    tender: TenderType,
    tendered: TenderedAmounts,
    settings: &RegisterSettings,
    customer_id: Option<String>,
    operator_id: &str,
) -> CoreResult<Transaction> {
    validate_operator_id(operator_id)?;

    if cart.is_empty() {
        return Err(CoreError::EmptyCart);
    }

    let totals = cart.totals(discount, settings.tax_rate);
    let total = Money::from_cents(totals.total_cents);

    let exchange_rate = settings.exchange_rate();
    let (tendered_primary, change) = match tender {
        TenderType::Cash => {
            if tendered.primary_cents < 0 || tendered.secondary_cents < 0 {
                return Err(CoreError::InvalidAmount {
                    reason: "tendered amounts cannot be negative".to_string(),
                });
            }
            if tendered.secondary_cents > 0 && exchange_rate.is_zero() {
                return Err(CoreError::InvalidAmount {
                    reason: "secondary currency tendered but none is configured".to_string(),
                });
            }

            let converted = exchange_rate.to_primary(Money::from_cents(tendered.secondary_cents));
            let paid = Money::from_cents(tendered.primary_cents) + converted;

            if paid.cents() < total.cents() - CASH_EPSILON_CENTS {
                return Err(CoreError::PaymentInsufficient {
                    total_cents: total.cents(),
                    tendered_cents: paid.cents(),
                });
            }

            let change = (paid - total).max(Money::zero());
            (paid, change)
        }
        // Card/digital settle exact: no change, no tender arithmetic
        TenderType::Card | TenderType::Digital => (total, Money::zero()),
    };

    let now = Utc::now();
    Ok(Transaction {
        id: Uuid::new_v4().to_string(),
        receipt_number: generate_receipt_number(now),
        kind: TransactionKind::Sale,
        lines: cart.lines.iter().map(TransactionLine::from).collect(),
        subtotal_cents: totals.subtotal_cents,
        discount_cents: totals.discount_cents,
        tax_cents: totals.tax_cents,
        total_cents: totals.total_cents,
        tender,
        tendered_cents: tendered_primary.cents(),
        change_cents: change.cents(),
        change_secondary_cents: exchange_rate.to_secondary(change).cents(),
        customer_id,
        original_transaction_id: None,
        operator_id: operator_id.to_string(),
        created_at: now,
    })
}

/// Builds a return transaction against an original sale.
///
/// Each `(product_id, quantity)` must exist in the original with a
/// quantity no greater than what was sold. Discount and tax are prorated
/// from the original by subtotal share, so a full return reproduces the
/// original's totals exactly. The refund travels the original's tender;
/// shift totals and loyalty accumulators are untouched by returns.
pub fn build_return(
    original: &Transaction,
    lines: &[(&str, i64)],
    operator_id: &str,
) -> CoreResult<Transaction> {
    validate_operator_id(operator_id)?;

    if original.kind != TransactionKind::Sale {
        return Err(CoreError::InvalidAmount {
            reason: "returns must reference a sale transaction".to_string(),
        });
    }
    if lines.is_empty() {
        return Err(CoreError::InvalidAmount {
            reason: "return has no lines".to_string(),
        });
    }

    let mut return_lines = Vec::with_capacity(lines.len());
    for &(product_id, quantity) in lines {
        let sold = original
            .lines
            .iter()
            .find(|l| l.product_id == product_id)
            .ok_or_else(|| CoreError::InvalidReturnLine {
                product_id: product_id.to_string(),
                reason: "not present in original transaction".to_string(),
            })?;

        if quantity < 1 {
            return Err(CoreError::InvalidReturnLine {
                product_id: product_id.to_string(),
                reason: "quantity must be at least 1".to_string(),
            });
        }
        if quantity > sold.quantity {
            return Err(CoreError::InvalidReturnLine {
                product_id: product_id.to_string(),
                reason: format!("quantity {} exceeds sold {}", quantity, sold.quantity),
            });
        }

        return_lines.push(TransactionLine {
            product_id: sold.product_id.clone(),
            name: sold.name.clone(),
            category: sold.category.clone(),
            unit_price_cents: sold.unit_price_cents,
            unit_cost_cents: sold.unit_cost_cents,
            quantity,
            line_total_cents: sold.unit_price_cents * quantity,
        });
    }

    let subtotal: i64 = return_lines.iter().map(|l| l.line_total_cents).sum();
    let discount = prorate(original.discount_cents, subtotal, original.subtotal_cents);
    let tax = prorate(original.tax_cents, subtotal, original.subtotal_cents);
    let total = subtotal - discount + tax;

    let now = Utc::now();
    Ok(Transaction {
        id: Uuid::new_v4().to_string(),
        receipt_number: generate_receipt_number(now),
        kind: TransactionKind::Return,
        lines: return_lines,
        subtotal_cents: subtotal,
        discount_cents: discount,
        tax_cents: tax,
        total_cents: total,
        tender: original.tender,
        tendered_cents: total,
        change_cents: 0,
        change_secondary_cents: 0,
        customer_id: original.customer_id.clone(),
        original_transaction_id: Some(original.id.clone()),
        operator_id: operator_id.to_string(),
        created_at: now,
    })
}

/// Prorates `amount` by `part / whole`, rounding half-up.
fn prorate(amount: i64, part: i64, whole: i64) -> i64 {
    if whole == 0 {
        return 0;
    }
    ((amount as i128 * part as i128 + whole as i128 / 2) / whole as i128) as i64
}

/// Generates a receipt number in format `YYMMDD-HHMMSS-NNNN`.
///
/// Date-derived so receipts sort chronologically for display; the tail
/// disambiguates within the same second.
fn generate_receipt_number(now: DateTime<Utc>) -> String {
    let seq = (now.timestamp_millis() % 10_000).abs();
    format!("{}-{:04}", now.format("%y%m%d-%H%M%S"), seq)
}

// =============================================================================
// Unit Tests
// =============================================================================
