//! Error types for the order ledger.

use crate::currency::Amount;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur while running the ledger engine.
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Failed to open or read the input file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parsing or writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Invalid event record
    #[error("Invalid record at row {row}: {message}")]
    InvalidRecord { row: usize, message: String },

    /// Missing input file argument
    #[error("Missing input file argument. Usage: order-ledger <input.csv> [--stats] [--period <period>] [--as-of <YYYY-MM-DD>]")]
    MissingArgument,

    /// Unknown flag or bad flag value
    #[error("Invalid argument {arg}: {message}")]
    InvalidArgument { arg: String, message: String },
}

/// Reasons an order refuses a new payment.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaymentRejected {
    #[error("payment amount must be greater than zero")]
    NonPositive,

    #[error("payment of {amount} exceeds outstanding balance of {balance}")]
    ExceedsBalance { amount: Amount, balance: Amount },

    #[error("payment reference {0} already exists on this order")]
    DuplicateRef(u32),
}
