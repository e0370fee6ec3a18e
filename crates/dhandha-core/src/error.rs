//! # Error Types
//!
//! Validation errors for the pure domain layer.
//!
//! The full taxonomy spans the workspace:
//! - `ValidationError` (this crate) - input and business-rule violations
//! - `DbError` (dhandha-db) - persistence failures
//! - `LedgerError` (dhandha-ledger) - what callers of the services see
//!
//! Errors are enum variants with context, never bare strings.

use thiserror::Error;

/// Input validation errors.
///
/// Raised before any state is touched, so a failed validation never leaves
/// a partial mutation behind.
#[derive(Debug, Error, PartialEq, Eq)]
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

    /// Invalid format (e.g., invalid UUID, non-numeric phone).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A line discount larger than the line subtotal.
    #[error("discount of {discount_paise} paise exceeds line subtotal of {subtotal_paise} paise")]
    DiscountExceedsSubtotal {
        discount_paise: i64,
        subtotal_paise: i64,
    },

    /// Checkout attempted with no items on the bill.
    #[error("cart is empty")]
    EmptyCart,

    /// An udhaar sale needs someone to owe the money.
    #[error("credit requires a customer")]
    CreditRequiresCustomer,
}

/// Convenience alias for validation results.
pub type ValidationResult<T> = Result<T, ValidationError>;
