//! # Ledger Error Types
//!
//! The caller-facing error taxonomy: NotFound, Validation, Conflict,
//! InsufficientStock, and Store for persistence failures. Database errors
//! are classified on the way up so callers never match on sqlx details.

use thiserror::Error;

use dhandha_core::ValidationError;
use dhandha_db::DbError;

/// Errors surfaced by ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Unknown entity ID.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A domain rule was violated before any mutation was attempted.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// A sale would take stock below zero under the blocking policy.
    #[error("insufficient stock for {product_id}: requested {requested}, available {available}")]
    InsufficientStock {
        product_id: String,
        requested: i64,
        available: i64,
    },

    /// A concurrent modification was detected by the store.
    #[error("conflict: {0}")]
    Conflict(String),

    /// Underlying persistence failure. The operation was not applied.
    #[error("store error: {0}")]
    Store(DbError),
}

impl LedgerError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        LedgerError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Lifts database errors, preserving the NotFound and conflict categories.
impl From<DbError> for LedgerError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => LedgerError::NotFound { entity, id },
            DbError::UniqueViolation { field } => {
                LedgerError::Conflict(format!("duplicate {field}"))
            }
            other => LedgerError::Store(other),
        }
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
