//! The errors the budget ledger can return.
//!
//! The classification follows the recovery semantics of the callers:
//!
//! - [`Validation`] is recoverable, the caller may retry with fixed input.
//! - [`Conflict`] and [`NotFound`] terminate the current flow.
//! - [`Database`] is a store failure, surfaced as a generic error.
//!
//! [`Validation`]: LedgerError::Validation
//! [`Conflict`]: LedgerError::Conflict
//! [`NotFound`]: LedgerError::NotFound
//! [`Database`]: LedgerError::Database
use sea_orm::DbErr;
use thiserror::Error;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("\"{0}\" already present!")]
    Conflict(String),
    #[error("\"{0}\" not found!")]
    NotFound(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::Conflict(a), Self::Conflict(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
