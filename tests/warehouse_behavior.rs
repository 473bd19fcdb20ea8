//! Behavior-driven tests for loading pipeline output into the DuckDB store.

use serde_json::{json, Value};
use tempfile::tempdir;
use tickdash_core::{
    clean, clean_and_transform, load, Interval, Period, QueryGuardrails, Warehouse,
    WarehouseConfig, WarehouseError, DEFAULT_TABLE,
};
use tickdash_tests::{intraday_bars, ScriptedSource};

async fn hourly_aapl() -> tickdash_core::HourlySeries {
    let raw = ScriptedSource::bars(intraday_bars())
        .into_fetcher()
        .fetch("AAPL", Interval::FifteenMinutes, Period::OneMonth)
        .await
        .expect("fetch");
    clean_and_transform(raw)
}

fn read_back(store: &std::path::Path, sql: &str) -> tickdash_core::QueryResult {
    Warehouse::open(WarehouseConfig::at_path(store))
        .expect("open store")
        .execute_query(sql, QueryGuardrails::default())
        .expect("query")
}

#[tokio::test]
async fn when_user_loads_hourly_series_table_mirrors_it() {
    // Given: three hourly buckets with an MA_3 column
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("stock_data.duckdb");
    let hourly = hourly_aapl().await;

    // When: the series is loaded into the default table
    let report = load(&hourly, &store, DEFAULT_TABLE).expect("load");

    // Then: the report and the table agree with the series
    assert_eq!(report.rows_written, 3);
    assert_eq!(report.table, "stock_hourly");
    assert!(store.exists());

    let result = read_back(&store, "SELECT * FROM stock_hourly ORDER BY Datetime");
    assert_eq!(
        result.column_names(),
        vec!["Datetime", "Open", "High", "Low", "Close", "Volume", "Ticker", "MA_3"]
    );
    assert_eq!(result.row_count, 3);
    assert_eq!(result.rows[0][0], json!("2024-01-02 09:00:00"));
    assert_eq!(result.rows[0][5], json!(3000));
    assert_eq!(result.rows[0][6], json!("AAPL"));
    assert_eq!(result.rows[0][7], Value::Null);
    assert_eq!(result.rows[1][7], Value::Null);
    assert!(result.rows[2][7]
        .as_f64()
        .is_some_and(|value| (value - (101.5 + 102.0 + 103.0) / 3.0).abs() < 1e-9));
}

#[tokio::test]
async fn loading_again_replaces_previous_rows() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("stock_data.duckdb");

    load(&hourly_aapl().await, &store, DEFAULT_TABLE).expect("first load");

    let mut shorter = hourly_aapl().await;
    shorter.buckets.truncate(1);
    shorter.moving_averages.clear();
    load(&shorter, &store, DEFAULT_TABLE).expect("second load");

    let result = read_back(&store, "SELECT * FROM stock_hourly");
    assert_eq!(result.row_count, 1);
    assert_eq!(
        result.column_names(),
        vec!["Datetime", "Open", "High", "Low", "Close", "Volume", "Ticker"]
    );
}

#[tokio::test]
async fn empty_series_leaves_empty_table() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("stock_data.duckdb");
    let raw = ScriptedSource::empty()
        .into_fetcher()
        .fetch("ZZZZ", Interval::OneDay, Period::OneMonth)
        .await
        .expect("fetch");

    let report = load(&clean_and_transform(raw), &store, DEFAULT_TABLE).expect("load");

    assert_eq!(report.rows_written, 0);
    let result = read_back(&store, "SELECT COUNT(*) FROM stock_hourly");
    assert_eq!(result.rows[0][0], json!(0));
}

#[tokio::test]
async fn cleaned_interval_series_loads_with_adjusted_close() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("stock_data.duckdb");
    let raw = ScriptedSource::bars(intraday_bars())
        .with_adj_close(vec![100.0, 101.0, 101.5, 102.5])
        .into_fetcher()
        .fetch("MSFT", Interval::FifteenMinutes, Period::OneMonth)
        .await
        .expect("fetch");

    let report = load(&clean(raw), &store, "stock_data").expect("load");

    assert_eq!(report.rows_written, 4);
    let result = read_back(&store, "SELECT \"Adj Close\", Ticker FROM stock_data LIMIT 1");
    assert_eq!(result.rows[0], vec![json!(100.0), json!("MSFT")]);
}

#[tokio::test]
async fn invalid_table_name_is_reported_with_target() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("stock_data.duckdb");

    let error = load(&hourly_aapl().await, &store, "drop table;").expect_err("bad name");

    assert_eq!(error.table(), "drop table;");
    assert_eq!(error.store(), store.as_path());
    assert!(matches!(error.cause(), WarehouseError::QueryRejected(_)));
}

#[tokio::test]
async fn store_rejects_writes_through_query_path() {
    let temp = tempdir().expect("tempdir");
    let store = temp.path().join("stock_data.duckdb");
    load(&hourly_aapl().await, &store, DEFAULT_TABLE).expect("load");

    let error = Warehouse::open(WarehouseConfig::at_path(&store))
        .expect("open")
        .execute_query("DELETE FROM stock_hourly", QueryGuardrails::default())
        .expect_err("read-only");

    assert!(matches!(error, WarehouseError::QueryRejected(_)));
}
