//! # Tickdash Warehouse
//!
//! DuckDB-backed table store for tickdash price series.
//!
//! ## Overview
//!
//! The store has exactly two jobs:
//!
//! - **Replace a table** with a fixed-schema [`TableFrame`] in one transaction
//!   (`CREATE OR REPLACE TABLE` followed by parameterized inserts).
//! - **Read it back** through guarded, read-only SQL with row and time limits.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tickdash_warehouse::{
//!     CellValue, ColumnDef, ColumnType, QueryGuardrails, TableFrame, Warehouse, WarehouseConfig,
//! };
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let warehouse = Warehouse::open(WarehouseConfig::at_path("stock_data.duckdb"))?;
//!
//!     let mut frame = TableFrame::new(vec![
//!         ColumnDef::new("Datetime", ColumnType::Timestamp),
//!         ColumnDef::new("Close", ColumnType::Double),
//!     ]);
//!     frame.push_row(vec![
//!         CellValue::Timestamp(String::from("2024-01-02 14:00:00")),
//!         CellValue::Double(Some(185.64)),
//!     ])?;
//!     warehouse.replace_table("stock_hourly", &frame)?;
//!
//!     let result = warehouse.execute_query(
//!         "SELECT * FROM stock_hourly",
//!         QueryGuardrails::default(),
//!     )?;
//!     println!("Found {} rows", result.row_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Security
//!
//! Cell values are always bound as parameters. Table names cannot be bound, so
//! they are validated against `[A-Za-z_][A-Za-z0-9_]*` and quoted.

pub mod duckdb;
mod error;
mod frame;

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use ::duckdb::types::{TimeUnit, Value as DuckValue};
use ::duckdb::Connection;
use ::duckdb::ToSql;
use serde::Serialize;
use serde_json::{Number, Value};
use time::macros::format_description;
use time::OffsetDateTime;
use tracing::{debug, info};

pub use duckdb::{AccessMode, DuckDbConnectionManager, PooledConnection};
pub use error::WarehouseError;
pub use frame::{CellValue, ColumnDef, ColumnType, TableFrame};

use frame::quote_identifier;

/// Default store file name used when none is given.
pub const DEFAULT_STORE_FILE: &str = "stock_data.duckdb";

/// Configuration for a table store.
#[derive(Debug, Clone)]
pub struct WarehouseConfig {
    /// Root directory for tickdash data.
    pub tickdash_home: PathBuf,
    /// Path to the `DuckDB` database file.
    pub db_path: PathBuf,
    /// Maximum number of idle connections kept per access mode.
    pub max_pool_size: usize,
}

impl Default for WarehouseConfig {
    fn default() -> Self {
        let tickdash_home = resolve_tickdash_home();
        let db_path = tickdash_home.join(DEFAULT_STORE_FILE);
        Self {
            tickdash_home,
            db_path,
            max_pool_size: 4,
        }
    }
}

impl WarehouseConfig {
    /// Store at an explicit path; relative paths resolve against the working directory.
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: path.into(),
            ..Self::default()
        }
    }
}

/// Guardrails for query execution to prevent resource exhaustion.
#[derive(Debug, Clone, Copy)]
pub struct QueryGuardrails {
    /// Maximum number of rows to return.
    pub max_rows: usize,
    /// Query timeout in milliseconds.
    pub query_timeout_ms: u64,
}

impl Default for QueryGuardrails {
    fn default() -> Self {
        Self {
            max_rows: 10_000,
            query_timeout_ms: 5_000,
        }
    }
}

impl QueryGuardrails {
    fn timeout(self) -> Duration {
        Duration::from_millis(self.query_timeout_ms.max(1))
    }

    fn validate(self) -> Result<(), WarehouseError> {
        if self.max_rows == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--max-rows must be greater than zero",
            )));
        }
        if self.query_timeout_ms == 0 {
            return Err(WarehouseError::QueryRejected(String::from(
                "--query-timeout-ms must be greater than zero",
            )));
        }
        Ok(())
    }
}

/// Column metadata for query results.
#[derive(Debug, Clone, Serialize)]
pub struct SqlColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: String,
}

/// Result of a read query.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub columns: Vec<SqlColumn>,
    /// Row data as JSON values.
    pub rows: Vec<Vec<Value>>,
    pub row_count: usize,
    /// Whether results were cut off at `max_rows`.
    pub truncated: bool,
}

impl QueryResult {
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|column| column.name.as_str()).collect()
    }
}

/// Handle to one DuckDB store file.
#[derive(Clone)]
pub struct Warehouse {
    manager: DuckDbConnectionManager,
}

impl Warehouse {
    /// Open a store, creating its parent directory if needed.
    pub fn open(config: WarehouseConfig) -> Result<Self, WarehouseError> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let manager = DuckDbConnectionManager::new(config.db_path, config.max_pool_size);
        // Fail at open time rather than on first use.
        drop(manager.acquire(AccessMode::ReadWrite)?);
        Ok(Self { manager })
    }

    pub fn db_path(&self) -> &Path {
        self.manager.db_path()
    }

    /// Replace `table` with the contents of `frame`.
    ///
    /// The table is dropped and recreated with the frame's schema, then every
    /// row is inserted, all inside one transaction. An empty frame still
    /// replaces the table. Returns the number of rows written.
    ///
    /// # Security
    /// Cell values are bound as parameters; `table` must be a plain identifier.
    pub fn replace_table(&self, table: &str, frame: &TableFrame) -> Result<usize, WarehouseError> {
        validate_table_name(table)?;
        if frame.columns().is_empty() {
            return Err(WarehouseError::QueryRejected(String::from(
                "cannot create a table without columns",
            )));
        }

        let connection = self.manager.acquire(AccessMode::ReadWrite)?;
        connection.execute_batch("BEGIN TRANSACTION")?;
        let result = (|| -> Result<usize, WarehouseError> {
            connection.execute_batch(frame.create_sql(table).as_str())?;

            let mut statement = connection.prepare(frame.insert_sql(table).as_str())?;
            for row in frame.rows() {
                let params = TableFrame::row_params(row);
                statement.execute(params.as_slice())?;
            }

            Ok(frame.row_count())
        })();

        let written = finalize_transaction(&connection, result)?;
        info!(
            table,
            store = %self.db_path().display(),
            rows = written,
            "replaced table"
        );
        Ok(written)
    }

    /// Execute a read-only SQL query with guardrails.
    ///
    /// Only a single SELECT/WITH/EXPLAIN/SHOW/DESCRIBE statement is accepted.
    pub fn execute_query(
        &self,
        sql: &str,
        guardrails: QueryGuardrails,
    ) -> Result<QueryResult, WarehouseError> {
        guardrails.validate()?;
        let sql = normalize_sql(sql)?;
        enforce_read_only_query(sql)?;

        debug!(sql, "executing read query");
        let connection = self.manager.acquire(AccessMode::ReadOnly)?;
        execute_select_query(&connection, sql, guardrails, Instant::now())
    }

    /// Read every row of `table`.
    pub fn read_table(
        &self,
        table: &str,
        guardrails: QueryGuardrails,
    ) -> Result<QueryResult, WarehouseError> {
        validate_table_name(table)?;
        let sql = format!("SELECT * FROM {}", quote_identifier(table));
        self.execute_query(sql.as_str(), guardrails)
    }
}

/// Commit on success, roll back on failure.
fn finalize_transaction<T>(
    connection: &Connection,
    result: Result<T, WarehouseError>,
) -> Result<T, WarehouseError> {
    match result {
        Ok(value) => {
            connection.execute_batch("COMMIT")?;
            Ok(value)
        }
        Err(error) => {
            let _ = connection.execute_batch("ROLLBACK");
            Err(error)
        }
    }
}

fn execute_select_query(
    connection: &Connection,
    sql: &str,
    guardrails: QueryGuardrails,
    started: Instant,
) -> Result<QueryResult, WarehouseError> {
    let mut statement = connection.prepare(sql)?;
    // Column metadata is only available once the statement has run.
    let _ = statement.query([] as [&dyn ToSql; 0])?;

    let column_count = statement.column_count();
    let mut columns = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let name = statement
            .column_name(index)
            .map(|name| name.to_string())
            .unwrap_or_else(|_| format!("column_{index}"));
        columns.push(SqlColumn {
            name,
            r#type: statement.column_type(index).to_string(),
        });
    }

    let mut rows_cursor = statement.query([] as [&dyn ToSql; 0])?;
    let mut rows = Vec::new();
    let mut truncated = false;
    while let Some(row) = rows_cursor.next()? {
        ensure_timeout(started, guardrails.timeout())?;

        if rows.len() >= guardrails.max_rows {
            truncated = true;
            break;
        }

        rows.push(read_row(row, column_count)?);
    }

    ensure_timeout(started, guardrails.timeout())?;

    Ok(QueryResult {
        columns,
        row_count: rows.len(),
        rows,
        truncated,
    })
}

fn read_row(row: &::duckdb::Row<'_>, column_count: usize) -> Result<Vec<Value>, ::duckdb::Error> {
    let mut output = Vec::with_capacity(column_count);
    for index in 0..column_count {
        let value: DuckValue = row.get(index)?;
        output.push(to_json_value(value));
    }
    Ok(output)
}

fn to_json_value(value: DuckValue) -> Value {
    match value {
        DuckValue::Null => Value::Null,
        DuckValue::Boolean(value) => Value::Bool(value),
        DuckValue::TinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::SmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::Int(value) => Value::Number(Number::from(value)),
        DuckValue::BigInt(value) => Value::Number(Number::from(value)),
        DuckValue::UTinyInt(value) => Value::Number(Number::from(value)),
        DuckValue::USmallInt(value) => Value::Number(Number::from(value)),
        DuckValue::UInt(value) => Value::Number(Number::from(value)),
        DuckValue::UBigInt(value) => Value::Number(Number::from(value)),
        DuckValue::Float(value) => number_from_f64(f64::from(value)),
        DuckValue::Double(value) => number_from_f64(value),
        DuckValue::Text(value) => Value::String(value),
        DuckValue::Blob(value) => Value::String(hex::encode(value)),
        DuckValue::Timestamp(unit, value) => timestamp_value(unit, value),
        other => Value::String(format!("{other:?}")),
    }
}

/// Render a TIMESTAMP the way it was written: `YYYY-MM-DD HH:MM:SS`.
fn timestamp_value(unit: TimeUnit, value: i64) -> Value {
    let nanos = i128::from(value)
        * match unit {
            TimeUnit::Second => 1_000_000_000,
            TimeUnit::Millisecond => 1_000_000,
            TimeUnit::Microsecond => 1_000,
            TimeUnit::Nanosecond => 1,
        };
    let format = format_description!("[year]-[month]-[day] [hour]:[minute]:[second]");
    OffsetDateTime::from_unix_timestamp_nanos(nanos)
        .ok()
        .and_then(|datetime| datetime.format(&format).ok())
        .map_or(Value::Null, Value::String)
}

/// NaN and infinities have no JSON form; they become `null`.
fn number_from_f64(value: f64) -> Value {
    Number::from_f64(value)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

fn validate_table_name(table: &str) -> Result<(), WarehouseError> {
    let mut chars = table.chars();
    let valid_start = chars
        .next()
        .is_some_and(|ch| ch.is_ascii_alphabetic() || ch == '_');
    if !valid_start || !chars.all(|ch| ch.is_ascii_alphanumeric() || ch == '_') {
        return Err(WarehouseError::QueryRejected(format!(
            "invalid table name '{table}', expected letters, digits and underscores"
        )));
    }
    Ok(())
}

fn normalize_sql(sql: &str) -> Result<&str, WarehouseError> {
    let normalized = sql.trim();
    if normalized.is_empty() {
        return Err(WarehouseError::QueryRejected(String::from(
            "query must not be empty",
        )));
    }
    Ok(normalized.trim_end_matches(';').trim())
}

fn enforce_read_only_query(sql: &str) -> Result<(), WarehouseError> {
    if !is_select_like(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "only SELECT/CTE queries are accepted",
        )));
    }
    if has_multiple_statements(sql) {
        return Err(WarehouseError::QueryRejected(String::from(
            "multiple SQL statements are not allowed",
        )));
    }
    Ok(())
}

fn is_select_like(sql: &str) -> bool {
    let first_keyword = sql
        .split_whitespace()
        .next()
        .unwrap_or_default()
        .to_ascii_uppercase();
    matches!(
        first_keyword.as_str(),
        "SELECT" | "WITH" | "EXPLAIN" | "SHOW" | "DESCRIBE"
    )
}

/// Count `;`-separated statements, ignoring separators inside quoted
/// string literals and identifiers.
fn has_multiple_statements(sql: &str) -> bool {
    let mut quote: Option<char> = None;
    let mut statements = 0;
    let mut current_has_text = false;

    for ch in sql.chars() {
        match quote {
            // A doubled quote (`''`) closes and reopens, so it stays literal.
            Some(open) if ch == open => quote = None,
            Some(_) => {}
            None => match ch {
                '\'' | '"' => {
                    quote = Some(ch);
                    current_has_text = true;
                }
                ';' => {
                    if current_has_text {
                        statements += 1;
                    }
                    current_has_text = false;
                }
                ch if !ch.is_whitespace() => current_has_text = true,
                _ => {}
            },
        }
    }
    if current_has_text {
        statements += 1;
    }
    statements > 1
}

fn ensure_timeout(started: Instant, timeout: Duration) -> Result<(), WarehouseError> {
    if started.elapsed() > timeout {
        return Err(WarehouseError::QueryTimeout {
            timeout_ms: timeout.as_millis().min(u128::from(u64::MAX)) as u64,
        });
    }
    Ok(())
}

/// `TICKDASH_HOME`, then `$HOME/.tickdash`, then `.tickdash`.
fn resolve_tickdash_home() -> PathBuf {
    if let Some(path) = env::var_os("TICKDASH_HOME") {
        let path = PathBuf::from(path);
        if !path.as_os_str().is_empty() {
            return path;
        }
    }

    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".tickdash");
    }

    PathBuf::from(".tickdash")
}
