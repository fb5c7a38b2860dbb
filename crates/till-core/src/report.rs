//! # Report Aggregator
//!
//! Derives KPIs from the committed transaction and expense history for a
//! date window. Aggregation is a pure function of its inputs — no hidden
//! state, fully re-computable, cache-free.
//!
//! Successive windows are relative to a caller-supplied `now`, so report
//! output is deterministic and testable.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::{Deserialize, Serialize};

use crate::transaction::Transaction;
use crate::types::{Expense, TransactionKind};

// =============================================================================
// Report Range
// =============================================================================

/// Date-window presets for reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportRange {
    Days7,
    Days30,
    Days90,
    AllTime,
}

impl ReportRange {
    /// The inclusive start of the window relative to `now`.
    /// All-time falls back to the epoch.
    pub fn start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            ReportRange::Days7 => now - Duration::days(7),
            ReportRange::Days30 => now - Duration::days(30),
            ReportRange::Days90 => now - Duration::days(90),
            ReportRange::AllTime => Utc.timestamp_opt(0, 0).single().unwrap_or(now),
        }
    }
}

// =============================================================================
// Report
// =============================================================================

/// Revenue accumulated for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductRevenue {
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    pub revenue_cents: i64,
}

/// Revenue accumulated for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue_cents: i64,
}

/// Aggregated KPIs for a date window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub range: ReportRange,

    pub sale_count: usize,
    pub return_count: usize,

    /// Sum of sale totals.
    pub gross_sales_cents: i64,
    /// Sum of return totals.
    pub total_returns_cents: i64,
    /// gross − returns.
    pub net_revenue_cents: i64,

    /// Cost of goods sold, net of returned goods.
    pub cogs_cents: i64,
    /// net revenue − COGS.
    pub gross_profit_cents: i64,

    pub total_expenses_cents: i64,
    /// gross profit − expenses.
    pub net_profit_cents: i64,

    /// Top products by sale revenue, descending; ties keep
    /// first-encountered order.
    pub top_products: Vec<ProductRevenue>,

    /// Sale revenue grouped by category, in first-encountered order.
    pub revenue_by_category: Vec<CategoryRevenue>,
}

/// Aggregates committed history into a report.
///
/// Both collections are filtered to `date >= range.start(now)`. Headline
/// figures net out returns; the per-product and per-category breakdowns
/// aggregate sale lines only.
pub fn aggregate(
    transactions: &[Transaction],
    expenses: &[Expense],
    range: ReportRange,
    now: DateTime<Utc>,
    top_n: usize,
) -> Report {
    let start = range.start(now);

    let mut sale_count = 0;
    let mut return_count = 0;
    let mut gross_sales = 0i64;
    let mut total_returns = 0i64;
    let mut sale_cogs = 0i64;
    let mut return_cogs = 0i64;

    let mut products: Vec<ProductRevenue> = Vec::new();
    let mut categories: Vec<CategoryRevenue> = Vec::new();

    for tx in transactions.iter().filter(|t| t.created_at >= start) {
        match tx.kind {
            TransactionKind::Sale => {
                sale_count += 1;
                gross_sales += tx.total_cents;

                for line in &tx.lines {
                    sale_cogs += line.unit_cost_cents * line.quantity;

                    match products.iter_mut().find(|p| p.product_id == line.product_id) {
                        Some(entry) => {
                            entry.quantity += line.quantity;
                            entry.revenue_cents += line.line_total_cents;
                        }
                        None => products.push(ProductRevenue {
                            product_id: line.product_id.clone(),
                            name: line.name.clone(),
                            quantity: line.quantity,
                            revenue_cents: line.line_total_cents,
                        }),
                    }

                    match categories.iter_mut().find(|c| c.category == line.category) {
                        Some(entry) => entry.revenue_cents += line.line_total_cents,
                        None => categories.push(CategoryRevenue {
                            category: line.category.clone(),
                            revenue_cents: line.line_total_cents,
                        }),
                    }
                }
            }
            TransactionKind::Return => {
                return_count += 1;
                total_returns += tx.total_cents;

                for line in &tx.lines {
                    return_cogs += line.unit_cost_cents * line.quantity;
                }
            }
        }
    }

    let total_expenses: i64 = expenses
        .iter()
        .filter(|e| e.incurred_at >= start)
        .map(|e| e.amount_cents)
        .sum();

    // Stable sort: equal revenues keep first-encountered order
    products.sort_by(|a, b| b.revenue_cents.cmp(&a.revenue_cents));
    products.truncate(top_n);

    let net_revenue = gross_sales - total_returns;
    let cogs = sale_cogs - return_cogs;
    let gross_profit = net_revenue - cogs;

    Report {
        range,
        sale_count,
        return_count,
        gross_sales_cents: gross_sales,
        total_returns_cents: total_returns,
        net_revenue_cents: net_revenue,
        cogs_cents: cogs,
        gross_profit_cents: gross_profit,
        total_expenses_cents: total_expenses,
        net_profit_cents: gross_profit - total_expenses,
        top_products: products,
        revenue_by_category: categories,
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
