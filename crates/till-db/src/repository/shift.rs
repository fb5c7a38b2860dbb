//! # Shift Repository
//!
//! Persistence for the shift ledger: shift rows plus their append-only
//! cash-movement log.
//!
//! ## Shift Lifecycle in Storage
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  1. OPEN    insert()          → shifts row, status 'open'           │
//! │  2. SELL    save_totals()     → guarded UPDATE ... status = 'open'  │
//! │  3. ADJUST  insert_movement() → cash_movements append               │
//! │  4. CLOSE   close()           → guarded UPDATE, status → 'closed'   │
//! │                                                                     │
//! │  A partial unique index (operator_id WHERE status = 'open') backs   │
//! │  the at-most-one-open-shift invariant at the storage layer too.     │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::{CashMovement, Shift, ShiftStatus};

/// Scalar shift columns; the movement log is loaded separately.
#[derive(Debug, sqlx::FromRow)]
struct ShiftRow {
    id: String,
    operator_id: String,
    opened_at: chrono::DateTime<chrono::Utc>,
    closed_at: Option<chrono::DateTime<chrono::Utc>>,
    starting_cash_cents: i64,
    cash_sales_cents: i64,
    card_sales_cents: i64,
    digital_sales_cents: i64,
    status: ShiftStatus,
    counted_cash_cents: Option<i64>,
    expected_cash_cents: Option<i64>,
    difference_cents: Option<i64>,
}

impl ShiftRow {
    fn into_shift(self, movements: Vec<CashMovement>) -> Shift {
        Shift {
            id: self.id,
            operator_id: self.operator_id,
            opened_at: self.opened_at,
            closed_at: self.closed_at,
            starting_cash_cents: self.starting_cash_cents,
            cash_sales_cents: self.cash_sales_cents,
            card_sales_cents: self.card_sales_cents,
            digital_sales_cents: self.digital_sales_cents,
            movements,
            status: self.status,
            counted_cash_cents: self.counted_cash_cents,
            expected_cash_cents: self.expected_cash_cents,
            difference_cents: self.difference_cents,
        }
    }
}

const SHIFT_COLUMNS: &str = r#"
    id, operator_id, opened_at, closed_at,
    starting_cash_cents, cash_sales_cents, card_sales_cents, digital_sales_cents,
    status, counted_cash_cents, expected_cash_cents, difference_cents
"#;

/// Repository for shift database operations.
#[derive(Debug, Clone)]
pub struct ShiftRepository {
    pool: SqlitePool,
}

impl ShiftRepository {
    /// Creates a new ShiftRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ShiftRepository { pool }
    }

    /// Inserts a freshly opened shift.
    ///
    /// The partial unique index turns a second open shift for the same
    /// operator into `UniqueViolation` even if two callers race.
    pub async fn insert(&self, shift: &Shift) -> DbResult<()> {
        debug!(id = %shift.id, operator = %shift.operator_id, "Inserting shift");

        sqlx::query(
            r#"
            INSERT INTO shifts (
                id, operator_id, opened_at, closed_at,
                starting_cash_cents, cash_sales_cents, card_sales_cents, digital_sales_cents,
                status, counted_cash_cents, expected_cash_cents, difference_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            "#,
        )
        .bind(&shift.id)
        .bind(&shift.operator_id)
        .bind(shift.opened_at)
        .bind(shift.closed_at)
        .bind(shift.starting_cash_cents)
        .bind(shift.cash_sales_cents)
        .bind(shift.card_sales_cents)
        .bind(shift.digital_sales_cents)
        .bind(shift.status)
        .bind(shift.counted_cash_cents)
        .bind(shift.expected_cash_cents)
        .bind(shift.difference_cents)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets the operator's OPEN shift with its movement log, if any.
    pub async fn get_active(&self, operator_id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_active_on(&mut conn, operator_id).await
    }

    /// `get_active` on an explicit connection (saga use).
    pub(crate) async fn get_active_on(
        conn: &mut SqliteConnection,
        operator_id: &str,
    ) -> DbResult<Option<Shift>> {
        let sql = format!(
            "SELECT {} FROM shifts WHERE operator_id = ?1 AND status = 'open'",
            SHIFT_COLUMNS
        );
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(operator_id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let movements = Self::load_movements(conn, &row.id).await?;
                Ok(Some(row.into_shift(movements)))
            }
            None => Ok(None),
        }
    }

    /// Gets a shift by ID with its movement log.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Shift>> {
        let mut conn = self.pool.acquire().await?;

        let sql = format!("SELECT {} FROM shifts WHERE id = ?1", SHIFT_COLUMNS);
        let row = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(row) => {
                let movements = Self::load_movements(&mut conn, &row.id).await?;
                Ok(Some(row.into_shift(movements)))
            }
            None => Ok(None),
        }
    }

    /// Lists the most recently opened shifts (without movement logs).
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Shift>> {
        let sql = format!(
            "SELECT {} FROM shifts ORDER BY opened_at DESC LIMIT ?1",
            SHIFT_COLUMNS
        );
        let rows = sqlx::query_as::<_, ShiftRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|r| r.into_shift(Vec::new())).collect())
    }

    /// Persists the tender totals of an OPEN shift.
    ///
    /// Totals are only ever written through this guarded UPDATE; a
    /// CLOSED shift cannot be touched (0 rows affected → error).
    pub async fn save_totals(&self, shift: &Shift) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::save_totals_on(&mut conn, shift).await
    }

    /// `save_totals` on an explicit connection (saga use).
    pub(crate) async fn save_totals_on(
        conn: &mut SqliteConnection,
        shift: &Shift,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                cash_sales_cents = ?2,
                card_sales_cents = ?3,
                digital_sales_cents = ?4
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(&shift.id)
        .bind(shift.cash_sales_cents)
        .bind(shift.card_sales_cents)
        .bind(shift.digital_sales_cents)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", &shift.id));
        }

        Ok(())
    }

    /// Appends a cash movement to a shift's log.
    pub async fn insert_movement(&self, shift_id: &str, movement: &CashMovement) -> DbResult<()> {
        debug!(shift_id = %shift_id, amount = %movement.amount_cents, "Recording cash movement");

        sqlx::query(
            r#"
            INSERT INTO cash_movements (
                id, shift_id, kind, amount_cents, reason, operator_id, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&movement.id)
        .bind(shift_id)
        .bind(movement.kind)
        .bind(movement.amount_cents)
        .bind(&movement.reason)
        .bind(&movement.operator_id)
        .bind(movement.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Persists the close of a shift: reconciliation fields plus the
    /// terminal status flip, guarded on `status = 'open'`.
    pub async fn close(&self, shift: &Shift) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE shifts SET
                status = 'closed',
                closed_at = ?2,
                counted_cash_cents = ?3,
                expected_cash_cents = ?4,
                difference_cents = ?5
            WHERE id = ?1 AND status = 'open'
            "#,
        )
        .bind(&shift.id)
        .bind(shift.closed_at)
        .bind(shift.counted_cash_cents)
        .bind(shift.expected_cash_cents)
        .bind(shift.difference_cents)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Open shift", &shift.id));
        }

        Ok(())
    }

    /// Loads a shift's movement log in record order.
    async fn load_movements(
        conn: &mut SqliteConnection,
        shift_id: &str,
    ) -> DbResult<Vec<CashMovement>> {
        let movements = sqlx::query_as::<_, CashMovement>(
            r#"
            SELECT id, kind, amount_cents, reason, operator_id, created_at
            FROM cash_movements
            WHERE shift_id = ?1
            ORDER BY created_at, id
            "#,
        )
        .bind(shift_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(movements)
    }
}
