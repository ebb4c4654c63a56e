//! The module contains the errors the ledger can return.
//!
//! The errors are:
//!
//! - [`Validation`] returned when a candidate transaction fails a business rule.
//! - [`DuplicateIdentifier`] returned when a unique identifier is already taken.
//! - [`NotFound`] returned when a transaction lookup matches nothing.
//! - [`Inconsistent`] returned when a write could not be confirmed by re-read.
//!
//! [`Validation`]: LedgerError::Validation
//! [`DuplicateIdentifier`]: LedgerError::DuplicateIdentifier
//! [`NotFound`]: LedgerError::NotFound
//! [`Inconsistent`]: LedgerError::Inconsistent
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// Ledger custom errors.
#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("unique identifier already exists: {0}")]
    DuplicateIdentifier(Uuid),
    #[error("transaction does not exist: {0}")]
    NotFound(Uuid),
    #[error("ledger state inconsistent: {0}")]
    Inconsistent(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl PartialEq for LedgerError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Validation(a), Self::Validation(b)) => a == b,
            (Self::DuplicateIdentifier(a), Self::DuplicateIdentifier(b)) => a == b,
            (Self::NotFound(a), Self::NotFound(b)) => a == b,
            (Self::Inconsistent(a), Self::Inconsistent(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
