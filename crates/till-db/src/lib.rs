//! # till-db: Database Layer for Till POS
//!
//! SQLite persistence for the Till POS core, plus the register
//! orchestration that commits checkouts atomically.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Till POS Data Flow                            │
//! │                                                                     │
//! │  Caller (UI / CLI)                                                  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  ┌───────────────────────────────────────────────────────────────┐  │
//! │  │                    till-db (THIS CRATE)                       │  │
//! │  │                                                               │  │
//! │  │  ┌──────────┐  ┌──────────────┐  ┌────────────┐  ┌─────────┐  │  │
//! │  │  │ Database │  │ Repositories │  │  Register  │  │Migrations│ │  │
//! │  │  │ (pool)   │◄─│ product/shift│◄─│  (saga)    │  │(embedded)│ │  │
//! │  │  └──────────┘  │ transaction..│  └────────────┘  └─────────┘  │  │
//! │  │                └──────────────┘                               │  │
//! │  └───────────────────────────────────────────────────────────────┘  │
//! │       │                                                             │
//! │       ▼                                                             │
//! │  SQLite (WAL mode, foreign keys on)                                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use till_db::{Database, DbConfig, Register};
//! use till_core::{Money, RegisterSettings};
//!
//! let db = Database::new(DbConfig::new("till.db")).await?;
//! let register = Register::new(db, RegisterSettings::default(), "op-1");
//!
//! register.open_shift(Money::from_cents(10_000)).await?;
//! // ... build a cart, then:
//! // register.checkout_sale(&cart, None, TenderType::Cash, tendered, None).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod register;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use register::{CheckoutOutcome, Register, RegisterError, RegisterResult};

// Repository re-exports for convenience
pub use repository::customer::CustomerRepository;
pub use repository::expense::ExpenseRepository;
pub use repository::product::ProductRepository;
pub use repository::shift::ShiftRepository;
pub use repository::transaction::TransactionRepository;
