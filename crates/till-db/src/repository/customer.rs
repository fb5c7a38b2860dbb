//! # Customer Repository
//!
//! Loyalty customer persistence. The spend/visit/point accumulators are
//! only written through `save_stats`, keeping mutations in one place.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use till_core::Customer;

const CUSTOMER_COLUMNS: &str = r#"
    id, name, phone, total_spent_cents, visit_count, points, created_at, updated_at
"#;

/// Repository for customer database operations.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    pool: SqlitePool,
}

impl CustomerRepository {
    /// Creates a new CustomerRepository.
    pub fn new(pool: SqlitePool) -> Self {
        CustomerRepository { pool }
    }

    /// Inserts a customer.
    pub async fn insert(&self, customer: &Customer) -> DbResult<()> {
        debug!(id = %customer.id, name = %customer.name, "Inserting customer");

        sqlx::query(
            r#"
            INSERT INTO customers (
                id, name, phone, total_spent_cents, visit_count, points,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
            "#,
        )
        .bind(&customer.id)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(customer.total_spent_cents)
        .bind(customer.visit_count)
        .bind(customer.points)
        .bind(customer.created_at)
        .bind(customer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a customer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Customer>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_by_id_on(&mut conn, id).await
    }

    /// `get_by_id` on an explicit connection (saga use).
    pub(crate) async fn get_by_id_on(
        conn: &mut SqliteConnection,
        id: &str,
    ) -> DbResult<Option<Customer>> {
        let sql = format!("SELECT {} FROM customers WHERE id = ?1", CUSTOMER_COLUMNS);
        let customer = sqlx::query_as::<_, Customer>(&sql)
            .bind(id)
            .fetch_optional(&mut *conn)
            .await?;

        Ok(customer)
    }

    /// Lists all customers, ordered by name.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        let sql = format!("SELECT {} FROM customers ORDER BY name", CUSTOMER_COLUMNS);
        let customers = sqlx::query_as::<_, Customer>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(customers)
    }

    /// Persists the loyalty accumulators computed by the inventory
    /// updater. Fails `NotFound` if the customer vanished.
    pub(crate) async fn save_stats_on(
        conn: &mut SqliteConnection,
        customer: &Customer,
    ) -> DbResult<()> {
        debug!(
            id = %customer.id,
            total_spent = %customer.total_spent_cents,
            points = %customer.points,
            "Updating customer stats"
        );

        let now = Utc::now();
        let result = sqlx::query(
            r#"
            UPDATE customers SET
                total_spent_cents = ?2,
                visit_count = ?3,
                points = ?4,
                updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&customer.id)
        .bind(customer.total_spent_cents)
        .bind(customer.visit_count)
        .bind(customer.points)
        .bind(now)
        .execute(&mut *conn)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Customer", &customer.id));
        }

        Ok(())
    }
}
