use thiserror::Error;

/// Errors that can occur during table store operations.
#[derive(Debug, Error)]
pub enum WarehouseError {
    /// `DuckDB` database error.
    #[error(transparent)]
    DuckDb(#[from] ::duckdb::Error),

    /// I/O error (creating the store directory).
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Statement was rejected before reaching the database.
    #[error("query rejected: {0}")]
    QueryRejected(String),

    /// Query execution timed out.
    #[error("query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    /// A row did not match the frame's column layout.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RowShape {
        row: usize,
        expected: usize,
        actual: usize,
    },
}
