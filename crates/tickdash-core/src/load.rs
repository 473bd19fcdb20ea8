//! Persist series as whole tables in a DuckDB store.

use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tickdash_warehouse::{
    CellValue, ColumnDef, ColumnType, TableFrame, Warehouse, WarehouseConfig, WarehouseError,
};
use tracing::info;

use crate::{HourlySeries, PriceSeries, Symbol, UtcDateTime};

/// Default store file, relative to the working directory.
pub const DEFAULT_STORE: &str = tickdash_warehouse::DEFAULT_STORE_FILE;
/// Default table for the hourly ETL output.
pub const DEFAULT_TABLE: &str = "stock_hourly";

/// A series that can describe itself as a fixed-schema table.
pub trait ToTableFrame {
    fn to_table_frame(&self) -> Result<TableFrame, WarehouseError>;
}

impl ToTableFrame for PriceSeries {
    fn to_table_frame(&self) -> Result<TableFrame, WarehouseError> {
        let mut frame = TableFrame::new(vec![
            ColumnDef::new("Datetime", ColumnType::Timestamp),
            ColumnDef::new("Open", ColumnType::Double),
            ColumnDef::new("High", ColumnType::Double),
            ColumnDef::new("Low", ColumnType::Double),
            ColumnDef::new("Close", ColumnType::Double),
            ColumnDef::new("Adj Close", ColumnType::Double),
            ColumnDef::new("Volume", ColumnType::BigInt),
            ColumnDef::new("Ticker", ColumnType::Varchar),
        ]);
        for row in &self.rows {
            frame.push_row(vec![
                timestamp_cell(row.timestamp),
                CellValue::Double(Some(row.open)),
                CellValue::Double(Some(row.high)),
                CellValue::Double(Some(row.low)),
                CellValue::Double(Some(row.close)),
                CellValue::Double(Some(row.adjusted_close)),
                volume_cell(row.volume),
                ticker_cell(&row.ticker),
            ])?;
        }
        Ok(frame)
    }
}

impl ToTableFrame for HourlySeries {
    fn to_table_frame(&self) -> Result<TableFrame, WarehouseError> {
        let mut columns = vec![
            ColumnDef::new("Datetime", ColumnType::Timestamp),
            ColumnDef::new("Open", ColumnType::Double),
            ColumnDef::new("High", ColumnType::Double),
            ColumnDef::new("Low", ColumnType::Double),
            ColumnDef::new("Close", ColumnType::Double),
            ColumnDef::new("Volume", ColumnType::BigInt),
            ColumnDef::new("Ticker", ColumnType::Varchar),
        ];
        columns.extend(
            self.moving_averages
                .iter()
                .map(|ma| ColumnDef::new(ma.name(), ColumnType::Double)),
        );

        let mut frame = TableFrame::new(columns);
        for (index, bucket) in self.buckets.iter().enumerate() {
            let mut cells = vec![
                timestamp_cell(bucket.timestamp),
                CellValue::Double(Some(bucket.open)),
                CellValue::Double(Some(bucket.high)),
                CellValue::Double(Some(bucket.low)),
                CellValue::Double(Some(bucket.close)),
                volume_cell(bucket.volume),
                ticker_cell(&bucket.ticker),
            ];
            cells.extend(
                self.moving_averages
                    .iter()
                    .map(|ma| CellValue::Double(ma.values.get(index).copied().flatten())),
            );
            frame.push_row(cells)?;
        }
        Ok(frame)
    }
}

fn timestamp_cell(timestamp: UtcDateTime) -> CellValue {
    CellValue::Timestamp(timestamp.format_sql())
}

fn volume_cell(volume: u64) -> CellValue {
    CellValue::BigInt(i64::try_from(volume).unwrap_or(i64::MAX))
}

fn ticker_cell(ticker: &Symbol) -> CellValue {
    CellValue::Text(ticker.as_str().to_owned())
}

/// Outcome of a successful [`load`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    pub store: PathBuf,
    pub table: String,
    pub rows_written: usize,
}

/// Persistence failure, tagged with the target store and table.
#[derive(Debug, Error)]
#[error("failed to load table '{table}' into store '{}': {source}", store.display())]
pub struct LoadError {
    store: PathBuf,
    table: String,
    #[source]
    source: WarehouseError,
}

impl LoadError {
    pub fn store(&self) -> &Path {
        &self.store
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn cause(&self) -> &WarehouseError {
        &self.source
    }
}

/// Write `series` to `table` in the store at `store`, replacing the table.
///
/// The table is dropped and recreated inside one transaction, so readers see
/// either the old rows or the new ones. An empty series leaves an empty table.
pub fn load<S>(series: &S, store: impl AsRef<Path>, table: &str) -> Result<LoadReport, LoadError>
where
    S: ToTableFrame + ?Sized,
{
    let store = store.as_ref().to_path_buf();
    let fail = |source: WarehouseError| LoadError {
        store: store.clone(),
        table: table.to_owned(),
        source,
    };

    let frame = series.to_table_frame().map_err(fail)?;
    let warehouse = Warehouse::open(WarehouseConfig::at_path(&store)).map_err(fail)?;
    let rows_written = warehouse.replace_table(table, &frame).map_err(fail)?;

    info!(
        "loaded {rows_written} rows into table '{table}' in store '{}'",
        store.display()
    );
    Ok(LoadReport {
        store,
        table: table.to_owned(),
        rows_written,
    })
}
