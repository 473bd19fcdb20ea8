use thiserror::Error;

/// Validation errors for user-supplied pipeline inputs.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("symbol cannot be empty")]
    EmptySymbol,
    #[error("symbol length {len} exceeds max {max}")]
    SymbolTooLong { len: usize, max: usize },
    #[error("symbol must start with an ASCII letter, digit or '^': '{ch}'")]
    SymbolInvalidStart { ch: char },
    #[error("symbol contains invalid character '{ch}' at index {index}")]
    SymbolInvalidChar { ch: char, index: usize },

    #[error("invalid interval '{value}', expected one of 5m, 15m, 30m, 1h, 1d")]
    InvalidInterval { value: String },
    #[error("invalid period '{value}', expected one of 1mo, 3mo, 6mo, 1y, 2y, 5y")]
    InvalidPeriod { value: String },

    #[error("timestamp must be RFC3339 UTC (suffix Z): '{value}'")]
    TimestampNotUtc { value: String },
    #[error("unix timestamp {value} is outside the supported date range")]
    TimestampOutOfRange { value: i64 },
}

/// Errors raised by the transform stages.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("moving-average window must be at least 1, got {window}")]
    InvalidWindow { window: usize },
}
