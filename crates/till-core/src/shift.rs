//! # Shift Ledger
//!
//! The cash-drawer state machine: open/close lifecycle, per-tender
//! running totals, cash-movement log, and close-time reconciliation.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                                                                     │
//! │   NONE ──open_shift──► OPEN ──close(counted)──► CLOSED (terminal)   │
//! │                         │ ▲                                         │
//! │                         │ │ record_sale(amount, tender)             │
//! │                         │ │ record_movement(in|out, amount)         │
//! │                         └─┘                                         │
//! │                                                                     │
//! │  While OPEN: tender totals are additive only, the movement log is   │
//! │  append-only. After CLOSED: everything is immutable.                │
//! │                                                                     │
//! │  Reconciliation at close:                                           │
//! │    expected = starting + cash_sales + pay_in − pay_out              │
//! │    difference = counted − expected                                  │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Corrections never decrement a sales total; they travel the
//! return-transaction path, which by design does not touch shift totals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::TenderType;
use crate::validation::{validate_operator_id, validate_reason};

// =============================================================================
// Shift Status
// =============================================================================

/// Lifecycle status of a shift. CLOSED is terminal.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftStatus {
    Open,
    Closed,
}

// =============================================================================
// Cash Movement
// =============================================================================

/// Direction of a manual drawer adjustment.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementKind {
    /// Money added to the drawer (pay-in).
    In,
    /// Money removed from the drawer (pay-out).
    Out,
}

/// A manual drawer adjustment outside of normal sales.
///
/// Append-only: never deleted or mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct CashMovement {
    pub id: String,
    pub kind: MovementKind,
    /// Always positive; direction is carried by `kind`.
    pub amount_cents: i64,
    pub reason: String,
    pub operator_id: String,
    pub created_at: DateTime<Utc>,
}

impl CashMovement {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }
}

// =============================================================================
// Shift
// =============================================================================

/// Summary produced when a shift closes, for the drawer slip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftSummary {
    pub total_sales_cents: i64,
    pub pay_in_cents: i64,
    pub pay_out_cents: i64,
    pub expected_cash_cents: i64,
    pub counted_cash_cents: i64,
    /// Signed: positive = overage, negative = shortage.
    pub difference_cents: i64,
}

/// One operator's bounded working session over which drawer totals are
/// tracked.
///
/// The shift owns its movement log exclusively and holds only aggregate
/// numbers derived from transactions — never references to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shift {
    pub id: String,
    pub operator_id: String,
    pub opened_at: DateTime<Utc>,
    pub closed_at: Option<DateTime<Utc>>,

    /// Cash float placed in the drawer at open.
    pub starting_cash_cents: i64,

    /// Per-tender running totals. Monotonically non-decreasing while OPEN.
    pub cash_sales_cents: i64,
    pub card_sales_cents: i64,
    pub digital_sales_cents: i64,

    /// Append-only pay-in/pay-out log, in record order.
    pub movements: Vec<CashMovement>,

    pub status: ShiftStatus,

    /// Set at close; None while OPEN.
    pub counted_cash_cents: Option<i64>,
    pub expected_cash_cents: Option<i64>,
    pub difference_cents: Option<i64>,
}

impl Shift {
    /// Opens a new shift for an operator.
    ///
    /// `existing_open` is the operator's currently active shift, if any
    /// (the caller looks it up); an OPEN one fails `ShiftAlreadyOpen`
    /// and is left untouched. A negative float fails `InvalidAmount`.
    pub fn open(
        existing_open: Option<&Shift>,
        operator_id: &str,
        starting_cash: Money,
    ) -> CoreResult<Shift> {
        validate_operator_id(operator_id)?;

        if let Some(shift) = existing_open {
            if shift.status == ShiftStatus::Open {
                return Err(CoreError::ShiftAlreadyOpen {
                    operator_id: operator_id.to_string(),
                });
            }
        }

        if starting_cash.is_negative() {
            return Err(CoreError::InvalidAmount {
                reason: "starting cash cannot be negative".to_string(),
            });
        }

        Ok(Shift {
            id: Uuid::new_v4().to_string(),
            operator_id: operator_id.to_string(),
            opened_at: Utc::now(),
            closed_at: None,
            starting_cash_cents: starting_cash.cents(),
            cash_sales_cents: 0,
            card_sales_cents: 0,
            digital_sales_cents: 0,
            movements: Vec::new(),
            status: ShiftStatus::Open,
            counted_cash_cents: None,
            expected_cash_cents: None,
            difference_cents: None,
        })
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.status == ShiftStatus::Open
    }

    /// Records a committed sale against exactly one tender bucket.
    ///
    /// A transaction has one payment method; its total is never split
    /// across tenders. Requires OPEN.
    pub fn record_sale(&mut self, amount: Money, tender: TenderType) -> CoreResult<()> {
        if !self.is_open() {
            return Err(CoreError::ShiftNotOpen);
        }
        if amount.is_negative() {
            return Err(CoreError::InvalidAmount {
                reason: "sale amount cannot be negative".to_string(),
            });
        }

        match tender {
            TenderType::Cash => self.cash_sales_cents += amount.cents(),
            TenderType::Card => self.card_sales_cents += amount.cents(),
            TenderType::Digital => self.digital_sales_cents += amount.cents(),
        }
        Ok(())
    }

    /// Appends a pay-in/pay-out movement to the drawer log.
    ///
    /// Amount must be strictly positive; requires OPEN. Returns the
    /// created movement so the caller can persist it.
    pub fn record_movement(
        &mut self,
        kind: MovementKind,
        amount: Money,
        reason: &str,
        operator_id: &str,
    ) -> CoreResult<CashMovement> {
        if !self.is_open() {
            return Err(CoreError::ShiftNotOpen);
        }
        if !amount.is_positive() {
            return Err(CoreError::InvalidAmount {
                reason: "movement amount must be positive".to_string(),
            });
        }
        validate_reason(reason)?;
        validate_operator_id(operator_id)?;

        let movement = CashMovement {
            id: Uuid::new_v4().to_string(),
            kind,
            amount_cents: amount.cents(),
            reason: reason.trim().to_string(),
            operator_id: operator_id.to_string(),
            created_at: Utc::now(),
        };
        self.movements.push(movement.clone());
        Ok(movement)
    }

    /// Sum of pay-in movements, in cents.
    pub fn pay_in_cents(&self) -> i64 {
        self.movements
            .iter()
            .filter(|m| m.kind == MovementKind::In)
            .map(|m| m.amount_cents)
            .sum()
    }

    /// Sum of pay-out movements, in cents.
    pub fn pay_out_cents(&self) -> i64 {
        self.movements
            .iter()
            .filter(|m| m.kind == MovementKind::Out)
            .map(|m| m.amount_cents)
            .sum()
    }

    /// Total sales across all tenders, in cents.
    pub fn total_sales_cents(&self) -> i64 {
        self.cash_sales_cents + self.card_sales_cents + self.digital_sales_cents
    }

    /// Cash expected in the drawer right now:
    /// `starting + cash_sales + pay_in − pay_out`.
    pub fn expected_cash(&self) -> Money {
        Money::from_cents(
            self.starting_cash_cents + self.cash_sales_cents + self.pay_in_cents()
                - self.pay_out_cents(),
        )
    }

    /// Closes the shift, reconciling counted cash against expected.
    ///
    /// Requires OPEN; closing an already-CLOSED shift fails
    /// `ShiftNotOpen` and never mutates the closed record. After close
    /// every field is immutable.
    pub fn close(&mut self, counted_cash: Money) -> CoreResult<ShiftSummary> {
        if !self.is_open() {
            return Err(CoreError::ShiftNotOpen);
        }
        if counted_cash.is_negative() {
            return Err(CoreError::InvalidAmount {
                reason: "counted cash cannot be negative".to_string(),
            });
        }

        let expected = self.expected_cash();
        let difference = counted_cash - expected;

        let summary = ShiftSummary {
            total_sales_cents: self.total_sales_cents(),
            pay_in_cents: self.pay_in_cents(),
            pay_out_cents: self.pay_out_cents(),
            expected_cash_cents: expected.cents(),
            counted_cash_cents: counted_cash.cents(),
            difference_cents: difference.cents(),
        };

        self.status = ShiftStatus::Closed;
        self.closed_at = Some(Utc::now());
        self.counted_cash_cents = Some(counted_cash.cents());
        self.expected_cash_cents = Some(expected.cents());
        self.difference_cents = Some(difference.cents());

        Ok(summary)
    }

    /// Close summary of a CLOSED shift, if available.
    pub fn summary(&self) -> Option<ShiftSummary> {
        match (
            self.counted_cash_cents,
            self.expected_cash_cents,
            self.difference_cents,
        ) {
            (Some(counted), Some(expected), Some(difference)) => Some(ShiftSummary {
                total_sales_cents: self.total_sales_cents(),
                pay_in_cents: self.pay_in_cents(),
                pay_out_cents: self.pay_out_cents(),
                expected_cash_cents: expected,
                counted_cash_cents: counted,
                difference_cents: difference,
            }),
            _ => None,
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
