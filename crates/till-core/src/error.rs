//! # Error Types
//!
//! Domain-specific error types for till-core.
//!
//! ## Propagation Policy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │  Validation errors (InsufficientStock, PaymentInsufficient,         │
//! │  InvalidAmount)   → recovered at the UI boundary, never retried     │
//! │                                                                     │
//! │  Sequencing errors (ShiftAlreadyOpen, ShiftNotOpen) → caller bug    │
//! │  in a correctly wired system, but still returned as typed results   │
//! │  so a defensive caller can recover                                  │
//! │                                                                     │
//! │  ProductNotFound during inventory application → non-fatal per line  │
//! │                                                                     │
//! │  Storage availability lives in till-db (DbError::Unavailable)       │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Errors are enum variants with context fields, never strings.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// These represent business rule violations; each variant maps to a
/// user-facing message at the UI boundary.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Requested quantity exceeds the available stock ceiling.
    #[error("Insufficient stock for {name}: available {available}, requested {requested}")]
    InsufficientStock {
        name: String,
        available: i64,
        requested: i64,
    },

    /// Cash tendered does not cover the transaction total.
    #[error("Payment insufficient: total {total_cents} cents, tendered {tendered_cents} cents")]
    PaymentInsufficient {
        total_cents: i64,
        tendered_cents: i64,
    },

    /// An OPEN shift already exists for this operator.
    #[error("Shift already open for operator {operator_id}")]
    ShiftAlreadyOpen { operator_id: String },

    /// The operation requires an OPEN shift.
    #[error("No open shift")]
    ShiftNotOpen,

    /// A monetary amount violates its precondition (e.g. movement <= 0).
    #[error("Invalid amount: {reason}")]
    InvalidAmount { reason: String },

    /// Product cannot be found (absent from catalog, or not in the cart).
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Checkout attempted on an empty cart.
    #[error("Cart is empty")]
    EmptyCart,

    /// Cart has exceeded the maximum number of lines.
    #[error("Cart cannot have more than {max} lines")]
    CartTooLarge { max: usize },

    /// Line quantity exceeds the maximum allowed.
    #[error("Quantity {requested} exceeds maximum allowed ({max})")]
    QuantityTooLarge { requested: i64, max: i64 },

    /// A returned line does not match the original transaction.
    #[error("Return line {product_id} invalid: {reason}")]
    InvalidReturnLine { product_id: String, reason: String },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors, raised before business logic runs.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g. invalid UUID, invalid barcode).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::InsufficientStock {
            name: "Cola 330ml".to_string(),
            available: 3,
            requested: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient stock for Cola 330ml: available 3, requested 5"
        );

        let err = CoreError::PaymentInsufficient {
            total_cents: 2750,
            tendered_cents: 2000,
        };
        assert!(err.to_string().contains("2750"));
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let validation_err = ValidationError::Required {
            field: "operator_id".to_string(),
        };
        let core_err: CoreError = validation_err.into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
