use tickdash_core::{QueryGuardrails, Warehouse, WarehouseConfig};
use uuid::Uuid;

use crate::cli::SqlArgs;
use crate::error::CliError;
use crate::output::Report;

pub fn run(args: &SqlArgs, run_id: Uuid) -> Result<Report, CliError> {
    // Opening a missing path would create an empty database file.
    if !args.store.exists() {
        return Err(CliError::StoreNotFound {
            path: args.store.clone(),
        });
    }
    let warehouse = Warehouse::open(WarehouseConfig::at_path(&args.store))?;
    let guardrails = QueryGuardrails {
        max_rows: args.max_rows,
        query_timeout_ms: args.query_timeout_ms,
    };

    let result = warehouse.execute_query(&args.query, guardrails)?;
    let truncated = result.truncated;
    let row_count = result.row_count;

    let report = Report::new(run_id, "sql", "duckdb", serde_json::to_value(result)?);
    if truncated {
        return Ok(report.with_warning(format!(
            "result truncated at {row_count} rows (use --max-rows to increase limit)"
        )));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use tickdash_core::{load, HourlyBucket, HourlySeries, Period, Symbol, UtcDateTime};

    use super::*;

    fn seeded_store(dir: &std::path::Path) -> std::path::PathBuf {
        let store = dir.join("stock_data.duckdb");
        let symbol = Symbol::parse("AAPL").expect("symbol");
        let buckets = (0..3)
            .map(|hour| HourlyBucket {
                timestamp: UtcDateTime::from_unix_timestamp(1_704_186_000 + hour * 3_600)
                    .expect("timestamp"),
                open: 100.0,
                high: 101.0,
                low: 99.0,
                close: 100.5,
                volume: 1_000,
                ticker: symbol.clone(),
            })
            .collect();
        let series = HourlySeries::new(symbol, Period::OneMonth, buckets);
        load(&series, &store, "stock_hourly").expect("load");
        store
    }

    fn args(store: std::path::PathBuf, query: &str, max_rows: usize) -> SqlArgs {
        SqlArgs {
            query: query.to_owned(),
            store,
            max_rows,
            query_timeout_ms: 5_000,
        }
    }

    #[test]
    fn query_reads_loaded_table() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(dir.path());

        let report = run(
            &args(store, "SELECT COUNT(*) AS n FROM stock_hourly", 10),
            Uuid::new_v4(),
        )
        .expect("query");

        assert_eq!(report.meta.source, "duckdb");
        assert_eq!(report.data["row_count"], 1);
        assert_eq!(report.data["rows"][0][0], 3);
        assert!(report.meta.warnings.is_empty());
    }

    #[test]
    fn truncation_adds_warning() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(dir.path());

        let report = run(&args(store, "SELECT * FROM stock_hourly", 2), Uuid::new_v4())
            .expect("query");

        assert_eq!(report.data["truncated"], true);
        assert_eq!(report.meta.warnings.len(), 1);
    }

    #[test]
    fn write_statements_are_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = seeded_store(dir.path());

        let error = run(&args(store, "DROP TABLE stock_hourly", 10), Uuid::new_v4())
            .expect_err("read-only");
        assert_eq!(error.exit_code(), 4);
    }

    #[test]
    fn missing_store_is_reported_without_creating_it() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = dir.path().join("never_loaded.duckdb");

        let error = run(&args(store.clone(), "SELECT 1", 10), Uuid::new_v4())
            .expect_err("missing store");

        assert!(matches!(error, CliError::StoreNotFound { .. }));
        assert_eq!(error.exit_code(), 4);
        assert!(error.to_string().contains("never_loaded.duckdb"));
        assert!(!store.exists());
    }
}
