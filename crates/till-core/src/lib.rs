//! # till-core: Pure Business Logic for Till POS
//!
//! This crate is the heart of Till POS: the transactional ledger and
//! shift-reconciliation core, as pure functions with zero I/O.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Till POS Architecture                          │
//! │                                                                     │
//! │  ┌───────────────────────────────────────────────────────────────┐ │
//! │  │                ★ till-core (THIS CRATE) ★                     │ │
//! │  │                                                               │ │
//! │  │  ┌─────────┐ ┌──────┐ ┌─────────────┐ ┌───────┐ ┌─────────┐  │ │
//! │  │  │  money  │ │ cart │ │ transaction │ │ shift │ │ report  │  │ │
//! │  │  └─────────┘ └──────┘ └─────────────┘ └───────┘ └─────────┘  │ │
//! │  │                                                               │ │
//! │  │  NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │ │
//! │  └───────────────────────────────┬───────────────────────────────┘ │
//! │                                  │                                 │
//! │  ┌───────────────────────────────▼───────────────────────────────┐ │
//! │  │              till-db (SQLite + register saga)                 │ │
//! │  └───────────────────────────────────────────────────────────────┘ │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Checkout Control Flow
//!
//! Cart Engine produces a draft → Transaction Builder validates payment
//! and freezes a [`transaction::Transaction`] → the caller commits it →
//! [`shift::Shift`] records the tender total → [`inventory`] applies
//! stock/loyalty deltas → [`report`] later reads the committed history.
//! Each arrow is a synchronous, caller-orchestrated step; no component
//! self-triggers the next.
//!
//! ## Design Principles
//!
//! 1. **Pure functions**: same input, same output; mutations are
//!    (old state, delta) → new state through defined operations
//! 2. **No I/O**: database, network, file system access is forbidden here
//! 3. **Integer money**: all monetary values are cents (i64)
//! 4. **Explicit errors**: all errors are typed, never strings or panics

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod error;
pub mod inventory;
pub mod money;
pub mod receipt;
pub mod report;
pub mod shift;
pub mod transaction;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{Cart, CartLine, CartTotals};
pub use error::{CoreError, CoreResult, ValidationError};
pub use inventory::{apply_transaction, AppliedTransaction};
pub use money::{ExchangeRate, LoyaltyRate, Money, TaxRate};
pub use report::{aggregate, Report, ReportRange};
pub use shift::{CashMovement, MovementKind, Shift, ShiftStatus, ShiftSummary};
pub use transaction::{
    build_return, build_sale, ChangeDue, TenderedAmounts, Transaction, TransactionLine,
};
pub use types::{
    Customer, DiscountSpec, Expense, Product, RegisterSettings, SecondaryCurrency, TenderType,
    TransactionKind,
};

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum unique lines allowed in a single cart.
pub const MAX_CART_LINES: usize = 100;

/// Maximum quantity of a single line in a cart.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Tolerance for cash sufficiency checks, in primary-currency cents.
///
/// Dual-currency tenders are converted before summing; one cent of
/// rounding slack keeps a conversion remainder from blocking checkout.
pub const CASH_EPSILON_CENTS: i64 = 1;

/// Maximum length of a cash-movement reason.
pub const MAX_REASON_LENGTH: usize = 200;
