//! # Tickdash Core
//!
//! Fetch, clean, resample and persist equity price series.
//!
//! ## Overview
//!
//! - **Fetcher**: asks a [`PriceSource`] for a ticker's history and normalizes
//!   the returned frame onto [`RawPriceRow`]s (flattened labels, ticker on every
//!   row, adjusted close backfilled from close).
//! - **Transformer**: [`transform::clean`], [`transform::resample_hourly`],
//!   [`transform::add_moving_average`] and [`transform::clean_and_transform`].
//! - **Loader**: [`load::load`] replaces a DuckDB table with a series.
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`adapters`] | Yahoo Finance chart adapter |
//! | [`data_source`] | Source trait, request and frame types |
//! | [`domain`] | Symbols, intervals, periods and series types |
//! | [`error`] | Core error types |
//! | [`fetch`] | Fetcher and frame normalization |
//! | [`http_client`] | HTTP client abstraction |
//! | [`load`] | Table-store loader |
//! | [`transform`] | Transform stages |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use tickdash_core::{load, transform, Fetcher, Interval, Period};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let fetcher = Fetcher::yahoo(10_000);
//!     let raw = fetcher.fetch("AAPL", Interval::FifteenMinutes, Period::OneMonth).await?;
//!
//!     let hourly = transform::clean_and_transform(raw);
//!     let report = load::load(&hourly, "stock_data.duckdb", "stock_hourly")?;
//!     println!("wrote {} rows", report.rows_written);
//!     Ok(())
//! }
//! ```

pub mod adapters;
pub mod data_source;
pub mod domain;
pub mod error;
pub mod fetch;
pub mod http_client;
pub mod load;
pub mod transform;

pub use adapters::YahooAdapter;

pub use data_source::{
    ColumnLabel, HistoryRequest, PriceSource, SourceColumn, SourceError, SourceErrorKind,
    SourceFrame,
};

pub use domain::{
    HourlyBucket, HourlySeries, Interval, MovingAverageColumn, Period, PriceRow, PriceSeries,
    RawPriceRow, RawPriceSeries, Symbol, UtcDateTime,
};

pub use error::{TransformError, ValidationError};

pub use fetch::{normalize_frame, FetchError, Fetcher};

pub use http_client::{
    HttpClient, HttpError, HttpRequest, HttpResponse, ReqwestHttpClient, DEFAULT_TIMEOUT_MS,
};

pub use load::{load, LoadError, LoadReport, ToTableFrame, DEFAULT_STORE, DEFAULT_TABLE};

pub use transform::{
    add_moving_average, clean, clean_and_transform, clean_and_transform_with, resample_hourly,
    DEFAULT_MA_WINDOW,
};

// Table store (re-exported from tickdash-warehouse)
pub use tickdash_warehouse::{
    QueryGuardrails, QueryResult, SqlColumn, Warehouse, WarehouseConfig, WarehouseError,
};
