//! # Expense Repository
//!
//! Recorded business expenses, read by the report aggregator.

use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;
use till_core::Expense;

/// Repository for expense database operations.
#[derive(Debug, Clone)]
pub struct ExpenseRepository {
    pool: SqlitePool,
}

impl ExpenseRepository {
    /// Creates a new ExpenseRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ExpenseRepository { pool }
    }

    /// Inserts an expense.
    pub async fn insert(&self, expense: &Expense) -> DbResult<()> {
        debug!(id = %expense.id, amount = %expense.amount_cents, "Inserting expense");

        sqlx::query(
            r#"
            INSERT INTO expenses (id, description, amount_cents, incurred_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&expense.id)
        .bind(&expense.description)
        .bind(expense.amount_cents)
        .bind(expense.incurred_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Lists expenses incurred at or after `start`, oldest first.
    pub async fn list_since(
        &self,
        start: chrono::DateTime<chrono::Utc>,
    ) -> DbResult<Vec<Expense>> {
        let expenses = sqlx::query_as::<_, Expense>(
            r#"
            SELECT id, description, amount_cents, incurred_at
            FROM expenses
            WHERE incurred_at >= ?1
            ORDER BY incurred_at
            "#,
        )
        .bind(start)
        .fetch_all(&self.pool)
        .await?;

        Ok(expenses)
    }
}
