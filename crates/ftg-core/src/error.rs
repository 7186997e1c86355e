//! Error types for ftg-core.

use thiserror::Error;

/// Core error types.
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("Invalid direction: {0}")]
    InvalidDirection(String),

    #[error("Invalid offset flag: {0}")]
    InvalidOffsetFlag(String),

    #[error("Invalid order price type: {0}")]
    InvalidOrderPriceType(String),

    #[error("Invalid time condition: {0}")]
    InvalidTimeCondition(String),

    #[error("Invalid volume condition: {0}")]
    InvalidVolumeCondition(String),

    #[error("Invalid contingent condition: {0}")]
    InvalidContingentCondition(String),

    #[error("Invalid hedge flag: {0}")]
    InvalidHedgeFlag(String),

    #[error("Invalid order action flag: {0}")]
    InvalidOrderActionFlag(String),

    #[error("Invalid order reference: {0}")]
    InvalidOrderRef(String),

    #[error("Invalid volume: {0}")]
    InvalidVolume(i64),

    #[error("Contingent condition {0} requires a positive stop price")]
    MissingStopPrice(String),

    #[error("Decimal parse error: {0}")]
    DecimalParse(#[from] rust_decimal::Error),
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
