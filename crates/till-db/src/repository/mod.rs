//! # Repository Module
//!
//! Database repository implementations for Till POS.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Register / caller                                                  │
//! │       │  db.products().get_by_barcode("4006381333931")              │
//! │       ▼                                                             │
//! │  ProductRepository ── SQL ──► SQLite                                │
//! │                                                                     │
//! │  Each repository owns the SQL for one aggregate. Methods with an    │
//! │  `_on` suffix take an explicit connection so the register saga can  │
//! │  compose them inside a single database transaction.                 │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

pub mod customer;
pub mod expense;
pub mod product;
pub mod shift;
pub mod transaction;
