//! # Transaction Repository
//!
//! Append-only persistence for the transaction history. Headers and
//! frozen line snapshots are written together; there is no UPDATE path
//! for either table.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::DbResult;
use till_core::{Transaction, TransactionLine};

/// Scalar transaction columns; lines are stitched on afterwards.
#[derive(Debug, sqlx::FromRow)]
struct TransactionRow {
    id: String,
    receipt_number: String,
    kind: till_core::TransactionKind,
    subtotal_cents: i64,
    discount_cents: i64,
    tax_cents: i64,
    total_cents: i64,
    tender: till_core::TenderType,
    tendered_cents: i64,
    change_cents: i64,
    change_secondary_cents: i64,
    customer_id: Option<String>,
    original_transaction_id: Option<String>,
    operator_id: String,
    created_at: chrono::DateTime<chrono::Utc>,
}

impl TransactionRow {
    fn into_transaction(self, lines: Vec<TransactionLine>) -> Transaction {
        Transaction {
            id: self.id,
            receipt_number: self.receipt_number,
            kind: self.kind,
            lines,
            subtotal_cents: self.subtotal_cents,
            discount_cents: self.discount_cents,
            tax_cents: self.tax_cents,
            total_cents: self.total_cents,
            tender: self.tender,
            tendered_cents: self.tendered_cents,
            change_cents: self.change_cents,
            change_secondary_cents: self.change_secondary_cents,
            customer_id: self.customer_id,
            original_transaction_id: self.original_transaction_id,
            operator_id: self.operator_id,
            created_at: self.created_at,
        }
    }
}

/// A line row joined with its owning transaction id, for bulk loads.
#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    transaction_id: String,
    #[sqlx(flatten)]
    line: TransactionLine,
}

const TRANSACTION_COLUMNS: &str = r#"
    id, receipt_number, kind,
    subtotal_cents, discount_cents, tax_cents, total_cents,
    tender, tendered_cents, change_cents, change_secondary_cents,
    customer_id, original_transaction_id, operator_id, created_at
"#;

/// Repository for transaction database operations.
#[derive(Debug, Clone)]
pub struct TransactionRepository {
    pool: SqlitePool,
}

impl TransactionRepository {
    /// Creates a new TransactionRepository.
    pub fn new(pool: SqlitePool) -> Self {
        TransactionRepository { pool }
    }

    /// Inserts a transaction header plus all of its lines.
    pub async fn insert(&self, transaction: &Transaction) -> DbResult<()> {
        let mut conn = self.pool.acquire().await?;
        Self::insert_on(&mut conn, transaction).await
    }

    /// `insert` on an explicit connection (saga use: the register wraps
    /// this in the same database transaction as the shift and stock
    /// updates).
    pub(crate) async fn insert_on(
        conn: &mut SqliteConnection,
        transaction: &Transaction,
    ) -> DbResult<()> {
        debug!(
            id = %transaction.id,
            receipt = %transaction.receipt_number,
            total = %transaction.total_cents,
            "Inserting transaction"
        );

        sqlx::query(
            r#"
            INSERT INTO transactions (
                id, receipt_number, kind,
                subtotal_cents, discount_cents, tax_cents, total_cents,
                tender, tendered_cents, change_cents, change_secondary_cents,
                customer_id, original_transaction_id, operator_id, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15
            )
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.receipt_number)
        .bind(transaction.kind)
        .bind(transaction.subtotal_cents)
        .bind(transaction.discount_cents)
        .bind(transaction.tax_cents)
        .bind(transaction.total_cents)
        .bind(transaction.tender)
        .bind(transaction.tendered_cents)
        .bind(transaction.change_cents)
        .bind(transaction.change_secondary_cents)
        .bind(&transaction.customer_id)
        .bind(&transaction.original_transaction_id)
        .bind(&transaction.operator_id)
        .bind(transaction.created_at)
        .execute(&mut *conn)
        .await?;

        for (line_no, line) in transaction.lines.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO transaction_lines (
                    id, transaction_id, line_no,
                    product_id, name, category,
                    unit_price_cents, unit_cost_cents, quantity, line_total_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                "#,
            )
            .bind(Uuid::new_v4().to_string())
            .bind(&transaction.id)
            .bind(line_no as i64)
            .bind(&line.product_id)
            .bind(&line.name)
            .bind(&line.category)
            .bind(line.unit_price_cents)
            .bind(line.unit_cost_cents)
            .bind(line.quantity)
            .bind(line.line_total_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }

    /// Gets a transaction by ID with its lines in original order.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Transaction>> {
        let sql = format!("SELECT {} FROM transactions WHERE id = ?1", TRANSACTION_COLUMNS);
        let row = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let lines = sqlx::query_as::<_, TransactionLine>(
            r#"
            SELECT product_id, name, category,
                   unit_price_cents, unit_cost_cents, quantity, line_total_cents
            FROM transaction_lines
            WHERE transaction_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(row.into_transaction(lines)))
    }

    /// Lists all transactions created at or after `start`, oldest first,
    /// with lines attached. This feeds the report aggregator.
    pub async fn list_since(
        &self,
        start: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions WHERE created_at >= ?1 ORDER BY created_at",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(start)
            .fetch_all(&self.pool)
            .await?;

        // One bulk line query instead of one per header
        let line_rows = sqlx::query_as::<_, LineRow>(
            r#"
            SELECT tl.transaction_id, tl.product_id, tl.name, tl.category,
                   tl.unit_price_cents, tl.unit_cost_cents, tl.quantity, tl.line_total_cents
            FROM transaction_lines tl
            JOIN transactions t ON t.id = tl.transaction_id
            WHERE t.created_at >= ?1
            ORDER BY tl.transaction_id, tl.line_no
            "#,
        )
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        let mut transactions: Vec<Transaction> = rows
            .into_iter()
            .map(|r| r.into_transaction(Vec::new()))
            .collect();

        for line_row in line_rows {
            if let Some(tx) = transactions
                .iter_mut()
                .find(|t| t.id == line_row.transaction_id)
            {
                tx.lines.push(line_row.line);
            }
        }

        Ok(transactions)
    }

    /// Lists the most recent transactions (headers only).
    pub async fn list_recent(&self, limit: i64) -> DbResult<Vec<Transaction>> {
        let sql = format!(
            "SELECT {} FROM transactions ORDER BY created_at DESC LIMIT ?1",
            TRANSACTION_COLUMNS
        );
        let rows = sqlx::query_as::<_, TransactionRow>(&sql)
            .bind(limit)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|r| r.into_transaction(Vec::new()))
            .collect())
    }
}
