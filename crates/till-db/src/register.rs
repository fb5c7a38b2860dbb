//! # Register Orchestration
//!
//! The single-operator checkout script: the glue between the pure core
//! and the SQLite store.
//!
//! ## The Checkout Saga
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  checkout_sale()                                                    │
//! │                                                                     │
//! │  BEGIN ───► load open shift (ShiftNotOpen if none)                  │
//! │        ───► build_sale()          validate payment, freeze record   │
//! │        ───► insert transaction + lines                              │
//! │        ───► shift.record_sale() → save tender totals                │
//! │        ───► apply stock deltas   (missing product: skip + warn)     │
//! │        ───► apply customer stats                                    │
//! │  COMMIT                                                             │
//! │                                                                     │
//! │  Every step runs inside ONE SQLite transaction: any failure rolls   │
//! │  the whole checkout back. Partial state cannot be observed.         │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{DbError, DbResult};
use crate::pool::Database;
use crate::repository::customer::CustomerRepository;
use crate::repository::product::ProductRepository;
use crate::repository::shift::ShiftRepository;
use crate::repository::transaction::TransactionRepository;
use till_core::receipt::{render_shift_slip, Receipt, DEFAULT_PAPER_WIDTH};
use till_core::{
    aggregate, apply_transaction, build_return, build_sale, Cart, CashMovement, CoreError,
    DiscountSpec, Money, MovementKind, RegisterSettings, Report, ReportRange, Shift, ShiftSummary,
    TenderType, TenderedAmounts, Transaction,
};

// =============================================================================
// Register Error
// =============================================================================

/// Errors surfaced by register operations: business rule violations from
/// the core, or storage failures from the database layer.
#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error(transparent)]
    Db(#[from] DbError),
}

impl RegisterError {
    /// Whether a calling layer may retry (storage-unavailable only).
    pub fn is_retryable(&self) -> bool {
        matches!(self, RegisterError::Db(e) if e.is_retryable())
    }
}

/// Result type for register operations.
pub type RegisterResult<T> = Result<T, RegisterError>;

// =============================================================================
// Checkout Outcome
// =============================================================================

/// The result of a committed checkout.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutOutcome {
    /// The committed, immutable transaction record.
    pub transaction: Transaction,

    /// Printable receipt view of the transaction.
    pub receipt: Receipt,

    /// Product ids whose stock could not be adjusted because the product
    /// vanished from the catalog between cart-build and commit.
    /// Non-fatal: the transaction still committed.
    pub skipped_products: Vec<String>,
}

// =============================================================================
// Register
// =============================================================================

/// One operator driving one till against the shared store.
///
/// All multi-step write sequences run inside a single database
/// transaction; the register never leaves partial state behind.
#[derive(Debug, Clone)]
pub struct Register {
    db: Database,
    settings: RegisterSettings,
    operator_id: String,
}

impl Register {
    /// Creates a register for an operator session.
    pub fn new(db: Database, settings: RegisterSettings, operator_id: impl Into<String>) -> Self {
        Register {
            db,
            settings,
            operator_id: operator_id.into(),
        }
    }

    /// The register's settings.
    pub fn settings(&self) -> &RegisterSettings {
        &self.settings
    }

    // -------------------------------------------------------------------------
    // Shift lifecycle
    // -------------------------------------------------------------------------

    /// Opens a shift with a starting cash float.
    ///
    /// Fails `ShiftAlreadyOpen` when the operator already has one; the
    /// storage layer's partial unique index backs the same invariant
    /// against races.
    pub async fn open_shift(&self, starting_cash: Money) -> RegisterResult<Shift> {
        let existing = self.db.shifts().get_active(&self.operator_id).await?;
        let shift = Shift::open(existing.as_ref(), &self.operator_id, starting_cash)?;

        self.db.shifts().insert(&shift).await?;

        info!(
            shift_id = %shift.id,
            operator = %self.operator_id,
            starting_cash = %starting_cash,
            "Shift opened"
        );
        Ok(shift)
    }

    /// The operator's currently open shift, if any.
    pub async fn active_shift(&self) -> RegisterResult<Option<Shift>> {
        Ok(self.db.shifts().get_active(&self.operator_id).await?)
    }

    /// Records a pay-in/pay-out drawer movement on the open shift.
    pub async fn record_cash_movement(
        &self,
        kind: MovementKind,
        amount: Money,
        reason: &str,
    ) -> RegisterResult<CashMovement> {
        let mut shift = self.require_open_shift().await?;
        let movement = shift.record_movement(kind, amount, reason, &self.operator_id)?;

        self.db.shifts().insert_movement(&shift.id, &movement).await?;

        info!(
            shift_id = %shift.id,
            kind = ?kind,
            amount = %amount,
            "Cash movement recorded"
        );
        Ok(movement)
    }

    /// Closes the open shift, reconciling counted cash against expected.
    /// Returns the closed shift and its reconciliation summary.
    pub async fn close_shift(
        &self,
        counted_cash: Money,
    ) -> RegisterResult<(Shift, ShiftSummary)> {
        let mut shift = self.require_open_shift().await?;
        let summary = shift.close(counted_cash)?;

        self.db.shifts().close(&shift).await?;

        info!(
            shift_id = %shift.id,
            expected = %summary.expected_cash_cents,
            counted = %summary.counted_cash_cents,
            difference = %summary.difference_cents,
            "Shift closed"
        );
        Ok((shift, summary))
    }

    /// Renders the drawer slip for a closed shift.
    pub fn drawer_slip(&self, shift: &Shift, summary: &ShiftSummary) -> String {
        render_shift_slip(shift, summary, &self.settings, DEFAULT_PAPER_WIDTH)
    }

    // -------------------------------------------------------------------------
    // Checkout
    // -------------------------------------------------------------------------

    /// Commits a sale: validates payment, freezes the transaction, and
    /// applies shift/stock/loyalty effects atomically.
    ///
    /// Any rejected precondition (insufficient cash, no open shift)
    /// blocks the commit entirely; there is no partial transaction.
    pub async fn checkout_sale(
        &self,
        cart: &Cart,
        discount: Option<DiscountSpec>,
        tender: TenderType,
        tendered: TenderedAmounts,
        customer_id: Option<String>,
    ) -> RegisterResult<CheckoutOutcome> {
        let mut db_tx = self.db.pool().begin().await.map_err(DbError::from)?;

        let mut shift = ShiftRepository::get_active_on(&mut *db_tx, &self.operator_id)
            .await?
            .ok_or(CoreError::ShiftNotOpen)?;

        let customer = match customer_id.as_deref() {
            Some(id) => Some(
                CustomerRepository::get_by_id_on(&mut *db_tx, id)
                    .await?
                    .ok_or_else(|| DbError::not_found("Customer", id))?,
            ),
            None => None,
        };

        let transaction = build_sale(
            cart,
            discount,
            tender,
            tendered,
            &self.settings,
            customer_id,
            &self.operator_id,
        )?;

        TransactionRepository::insert_on(&mut *db_tx, &transaction).await?;

        shift.record_sale(transaction.total(), tender)?;
        ShiftRepository::save_totals_on(&mut *db_tx, &shift).await?;

        let skipped = self
            .apply_effects(&mut db_tx, &transaction, customer.as_ref())
            .await?;

        db_tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %transaction.id,
            receipt = %transaction.receipt_number,
            total = %transaction.total_cents,
            tender = ?tender,
            "Sale committed"
        );

        let receipt = Receipt::from_transaction(&transaction, &self.settings);
        Ok(CheckoutOutcome {
            transaction,
            receipt,
            skipped_products: skipped,
        })
    }

    /// Commits a return against an original sale.
    ///
    /// Returned goods go back into stock; shift tender totals and
    /// loyalty accumulators are untouched — the return surfaces in
    /// reporting as a negative contribution to net revenue.
    pub async fn checkout_return(
        &self,
        original_transaction_id: &str,
        lines: &[(&str, i64)],
    ) -> RegisterResult<CheckoutOutcome> {
        let original = self
            .db
            .transactions()
            .get_by_id(original_transaction_id)
            .await?
            .ok_or_else(|| DbError::not_found("Transaction", original_transaction_id))?;

        let transaction = build_return(&original, lines, &self.operator_id)?;

        let mut db_tx = self.db.pool().begin().await.map_err(DbError::from)?;

        TransactionRepository::insert_on(&mut *db_tx, &transaction).await?;
        let skipped = self.apply_effects(&mut db_tx, &transaction, None).await?;

        db_tx.commit().await.map_err(DbError::from)?;

        info!(
            transaction_id = %transaction.id,
            original = %original_transaction_id,
            total = %transaction.total_cents,
            "Return committed"
        );

        let receipt = Receipt::from_transaction(&transaction, &self.settings);
        Ok(CheckoutOutcome {
            transaction,
            receipt,
            skipped_products: skipped,
        })
    }

    // -------------------------------------------------------------------------
    // Reporting
    // -------------------------------------------------------------------------

    /// Aggregates the committed history into a report for the window.
    pub async fn report(&self, range: ReportRange, top_n: usize) -> RegisterResult<Report> {
        let now = Utc::now();
        let start = range.start(now);

        let transactions = self.db.transactions().list_since(start).await?;
        let expenses = self.db.expenses().list_since(start).await?;

        Ok(aggregate(&transactions, &expenses, range, now, top_n))
    }

    // -------------------------------------------------------------------------
    // Internals
    // -------------------------------------------------------------------------

    async fn require_open_shift(&self) -> RegisterResult<Shift> {
        self.db
            .shifts()
            .get_active(&self.operator_id)
            .await?
            .ok_or(CoreError::ShiftNotOpen.into())
    }

    /// Applies stock and loyalty deltas for a committed transaction
    /// inside the surrounding database transaction.
    async fn apply_effects(
        &self,
        db_tx: &mut sqlx::Transaction<'_, sqlx::Sqlite>,
        transaction: &Transaction,
        customer: Option<&till_core::Customer>,
    ) -> DbResult<Vec<String>> {
        let mut catalog = Vec::with_capacity(transaction.lines.len());
        for line in &transaction.lines {
            if let Some(product) =
                ProductRepository::get_by_id_on(&mut *db_tx, &line.product_id).await?
            {
                catalog.push(product);
            }
        }

        let applied =
            apply_transaction(transaction, &catalog, customer, self.settings.loyalty_rate);

        for missing in &applied.missing_products {
            warn!(
                transaction_id = %transaction.id,
                product_id = %missing,
                "Product missing from catalog; line skipped for stock adjustment"
            );
        }

        for product in &applied.updated_products {
            ProductRepository::set_stock_on(&mut *db_tx, &product.id, product.stock).await?;
        }

        if let Some(updated) = &applied.updated_customer {
            CustomerRepository::save_stats_on(&mut *db_tx, updated).await?;
        }

        Ok(applied.missing_products)
    }
}
