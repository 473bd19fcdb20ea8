//! Column-typed row sets handed to [`Warehouse::replace_table`](crate::Warehouse::replace_table).

use ::duckdb::ToSql;

use crate::WarehouseError;

/// Storage type of a frame column.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    /// Naive timestamp; cells carry `YYYY-MM-DD HH:MM:SS` text in UTC.
    Timestamp,
    Double,
    BigInt,
    Varchar,
}

impl ColumnType {
    pub const fn sql_type(self) -> &'static str {
        match self {
            Self::Timestamp => "TIMESTAMP",
            Self::Double => "DOUBLE",
            Self::BigInt => "BIGINT",
            Self::Varchar => "VARCHAR",
        }
    }

    fn placeholder(self) -> &'static str {
        match self {
            Self::Timestamp => "CAST(? AS TIMESTAMP)",
            Self::Double | Self::BigInt | Self::Varchar => "?",
        }
    }
}

/// Named, typed column of a [`TableFrame`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub name: String,
    pub column_type: ColumnType,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
        }
    }
}

/// One cell value. `Double(None)` stores SQL `NULL`.
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Timestamp(String),
    Double(Option<f64>),
    BigInt(i64),
    Text(String),
}

impl CellValue {
    fn as_param(&self) -> &dyn ToSql {
        match self {
            Self::Timestamp(value) | Self::Text(value) => value,
            Self::Double(value) => value,
            Self::BigInt(value) => value,
        }
    }
}

/// Fixed-schema row set written as a whole table.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TableFrame {
    columns: Vec<ColumnDef>,
    rows: Vec<Vec<CellValue>>,
}

impl TableFrame {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Append a row. The cell count must match the column count.
    pub fn push_row(&mut self, row: Vec<CellValue>) -> Result<(), WarehouseError> {
        if row.len() != self.columns.len() {
            return Err(WarehouseError::RowShape {
                row: self.rows.len(),
                expected: self.columns.len(),
                actual: row.len(),
            });
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn columns(&self) -> &[ColumnDef] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<CellValue>] {
        &self.rows
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub(crate) fn create_sql(&self, table: &str) -> String {
        let columns = self
            .columns
            .iter()
            .map(|column| {
                format!(
                    "{} {}",
                    quote_identifier(&column.name),
                    column.column_type.sql_type()
                )
            })
            .collect::<Vec<_>>()
            .join(", ");
        format!("CREATE OR REPLACE TABLE {} ({columns})", quote_identifier(table))
    }

    pub(crate) fn insert_sql(&self, table: &str) -> String {
        let names = self
            .columns
            .iter()
            .map(|column| quote_identifier(&column.name))
            .collect::<Vec<_>>()
            .join(", ");
        let placeholders = self
            .columns
            .iter()
            .map(|column| column.column_type.placeholder())
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "INSERT INTO {} ({names}) VALUES ({placeholders})",
            quote_identifier(table)
        )
    }

    pub(crate) fn row_params(row: &[CellValue]) -> Vec<&dyn ToSql> {
        row.iter().map(CellValue::as_param).collect()
    }
}

/// Quote an identifier for DuckDB, doubling embedded quotes.
pub(crate) fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_frame() -> TableFrame {
        TableFrame::new(vec![
            ColumnDef::new("Datetime", ColumnType::Timestamp),
            ColumnDef::new("Adj Close", ColumnType::Double),
            ColumnDef::new("Ticker", ColumnType::Varchar),
        ])
    }

    #[test]
    fn rejects_rows_with_wrong_cell_count() {
        let mut frame = sample_frame();
        let err = frame
            .push_row(vec![CellValue::Double(Some(1.0))])
            .expect_err("must fail");
        assert!(matches!(
            err,
            WarehouseError::RowShape {
                expected: 3,
                actual: 1,
                ..
            }
        ));
    }

    #[test]
    fn builds_quoted_create_and_insert_statements() {
        let frame = sample_frame();
        assert_eq!(
            frame.create_sql("stock_hourly"),
            "CREATE OR REPLACE TABLE \"stock_hourly\" (\"Datetime\" TIMESTAMP, \"Adj Close\" DOUBLE, \"Ticker\" VARCHAR)"
        );
        assert_eq!(
            frame.insert_sql("stock_hourly"),
            "INSERT INTO \"stock_hourly\" (\"Datetime\", \"Adj Close\", \"Ticker\") VALUES (CAST(? AS TIMESTAMP), ?, ?)"
        );
    }
}
