//! # Seed Data Generator
//!
//! Populates the database with demo catalog, customer and expense data
//! for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p till-db --bin seed
//! cargo run -p till-db --bin seed -- --db ./data/till.db
//! ```

use chrono::{Duration, Utc};
use std::env;
use tracing::info;
use uuid::Uuid;

use till_core::{Customer, Expense, Product};
use till_db::{Database, DbConfig};

/// Demo catalog: (name, category, barcode, price_cents, cost_cents, stock)
const PRODUCTS: &[(&str, &str, Option<&str>, i64, i64, i64)] = &[
    ("Espresso", "Coffee", None, 250, 60, 500),
    ("Americano", "Coffee", None, 300, 70, 500),
    ("Flat White", "Coffee", None, 380, 95, 500),
    ("Cola 330ml", "Beverages", Some("5449000000996"), 220, 90, 120),
    ("Orange Juice 250ml", "Beverages", Some("4006381333931"), 280, 120, 80),
    ("Still Water 500ml", "Beverages", Some("3057640257773"), 150, 40, 200),
    ("Butter Croissant", "Bakery", None, 320, 110, 40),
    ("Cinnamon Roll", "Bakery", None, 350, 130, 30),
    ("Sourdough Loaf", "Bakery", Some("2000000000015"), 650, 240, 15),
    ("Ham & Cheese Sandwich", "Food", None, 550, 230, 25),
    ("Caesar Salad", "Food", None, 720, 310, 18),
    ("Chocolate Bar", "Snacks", Some("7622210449283"), 180, 80, 90),
    ("Salted Chips", "Snacks", Some("8710398527560"), 210, 95, 75),
];

const CUSTOMERS: &[(&str, Option<&str>)] = &[
    ("Dana Whitfield", Some("+1-555-0141")),
    ("Jordan Okafor", None),
    ("Sam Leclerc", Some("+1-555-0187")),
];

const EXPENSES: &[(&str, i64, i64)] = &[
    // (description, amount_cents, days_ago)
    ("Milk delivery", 4200, 1),
    ("Window cleaning", 3500, 6),
    ("Coffee beans restock", 18_500, 12),
    ("Rent", 120_000, 25),
];

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let db_path = parse_db_path().unwrap_or_else(|| "./till.db".to_string());

    info!(path = %db_path, "Seeding database");

    let db = Database::new(DbConfig::new(&db_path))
        .await
        .expect("failed to open database");

    let now = Utc::now();

    let products = db.products();
    for &(name, category, barcode, price_cents, cost_cents, stock) in PRODUCTS {
        let product = Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            category: category.to_string(),
            barcode: barcode.map(str::to_string),
            price_cents,
            cost_cents,
            stock,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        products.insert(&product).await.expect("insert product");
    }
    info!(count = PRODUCTS.len(), "Products seeded");

    let customers = db.customers();
    for &(name, phone) in CUSTOMERS {
        let customer = Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.map(str::to_string),
            total_spent_cents: 0,
            visit_count: 0,
            points: 0,
            created_at: now,
            updated_at: now,
        };
        customers.insert(&customer).await.expect("insert customer");
    }
    info!(count = CUSTOMERS.len(), "Customers seeded");

    let expenses = db.expenses();
    for &(description, amount_cents, days_ago) in EXPENSES {
        let expense = Expense {
            id: Uuid::new_v4().to_string(),
            description: description.to_string(),
            amount_cents,
            incurred_at: now - Duration::days(days_ago),
        };
        expenses.insert(&expense).await.expect("insert expense");
    }
    info!(count = EXPENSES.len(), "Expenses seeded");

    db.close().await;
    info!("Seed complete");
}

/// Parses `--db <path>` from the command line.
fn parse_db_path() -> Option<String> {
    let args: Vec<String> = env::args().collect();
    args.iter()
        .position(|a| a == "--db")
        .and_then(|i| args.get(i + 1))
        .cloned()
}
