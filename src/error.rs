//! Errors raised by the ledger and its storage.
//!
//! Every failure leaves the live store unchanged. A budget overrun is not an
//! error on its own: it only surfaces as [`OverrunNotConfirmed`] when the
//! caller did not confirm it.
//!
//!  [`OverrunNotConfirmed`]: LedgerError::OverrunNotConfirmed
use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Validation(String),
    #[error("\"{0}\" already exists")]
    DuplicateCode(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Budget exceeded: balance {balance}, expense {total}")]
    OverrunNotConfirmed { balance: Decimal, total: Decimal },
    #[error("Invalid data file: {0}")]
    InvalidImport(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
    #[error("Configuration error: {0}")]
    Config(#[from] ::config::ConfigError),
}

pub type LedgerResult<T> = Result<T, LedgerError>;
