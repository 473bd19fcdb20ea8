//! CLI argument definitions for tickdash.
//!
//! # Commands
//!
//! | Command | Description |
//! |---------|-------------|
//! | `fetch` | Download one ticker's history and print it |
//! | `etl` | Fetch, resample to hourly buckets, and load into DuckDB |
//! | `sql` | Run a read-only query against the local store |
//! | `serve` | Start the interactive dashboard |
//!
//! # Global Options
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `--pretty` | `false` | Pretty-print JSON output |
//! | `--timeout-ms` | `10000` | Upstream request timeout in ms |
//!
//! # Examples
//!
//! ```bash
//! # Hourly AAPL bars with a 3-bar moving average, into stock_data.duckdb
//! tickdash etl AAPL
//!
//! # Inspect what was loaded
//! tickdash sql "SELECT * FROM stock_hourly ORDER BY Datetime DESC LIMIT 5" --pretty
//!
//! # Dashboard on http://localhost:8080
//! tickdash serve
//! ```

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tickdash_core::{
    Interval, Period, DEFAULT_MA_WINDOW, DEFAULT_STORE, DEFAULT_TABLE, DEFAULT_TIMEOUT_MS,
};

/// Stock price pipeline and dashboard.
#[derive(Debug, Parser)]
#[command(
    name = "tickdash",
    author,
    version,
    about = "Stock price pipeline and dashboard",
    long_about = "tickdash downloads OHLCV history from Yahoo Finance, cleans it, resamples it \
into hourly buckets with a trailing moving average, and stores the result in a local DuckDB \
file. The same data can be explored in a browser dashboard.\n\
\n\
Use 'tickdash <command> --help' for command-specific help."
)]
pub struct Cli {
    /// Pretty-print JSON output with indentation.
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Upstream request timeout in milliseconds.
    #[arg(long, global = true, default_value_t = DEFAULT_TIMEOUT_MS)]
    pub timeout_ms: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Download price history for one ticker.
    ///
    /// Prints the cleaned series, or the untouched rows with `--raw`.
    Fetch(FetchArgs),

    /// Run the full pipeline: fetch, clean, resample hourly, add a moving
    /// average, and replace the target table.
    Etl(EtlArgs),

    /// Run a read-only SQL query against the local store.
    Sql(SqlArgs),

    /// Serve the interactive dashboard.
    Serve(ServeArgs),
}

#[derive(Debug, Args)]
pub struct FetchArgs {
    /// Ticker symbol, e.g. AAPL or ^GSPC.
    pub symbol: String,

    /// Bar interval: 5m, 15m, 30m, 1h, 1d.
    #[arg(long, default_value = "1d")]
    pub interval: Interval,

    /// Lookback period: 1mo, 3mo, 6mo, 1y, 2y, 5y.
    #[arg(long, default_value = "1mo")]
    pub period: Period,

    /// Print rows as received, before cleaning.
    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

#[derive(Debug, Args)]
pub struct EtlArgs {
    /// Ticker symbol, e.g. AAPL or ^GSPC.
    pub symbol: String,

    /// Bar interval of the source data.
    #[arg(long, default_value = "15m")]
    pub interval: Interval,

    /// Lookback period.
    #[arg(long, default_value = "1mo")]
    pub period: Period,

    /// DuckDB store file.
    #[arg(long, default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    /// Table to create or replace.
    #[arg(long, default_value = DEFAULT_TABLE)]
    pub table: String,

    /// Moving-average window, in hourly buckets.
    #[arg(long, default_value_t = DEFAULT_MA_WINDOW)]
    pub window: usize,
}

#[derive(Debug, Args)]
pub struct SqlArgs {
    /// SQL query (SELECT, WITH, EXPLAIN, SHOW, DESCRIBE).
    pub query: String,

    /// DuckDB store file.
    #[arg(long, default_value = DEFAULT_STORE)]
    pub store: PathBuf,

    /// Maximum number of rows to return.
    #[arg(long, default_value_t = 10_000)]
    pub max_rows: usize,

    /// Query timeout in milliseconds.
    #[arg(long, default_value_t = 5_000)]
    pub query_timeout_ms: u64,
}

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Address to bind.
    #[arg(long, default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on.
    #[arg(long, default_value_t = 8080)]
    pub port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn etl_defaults_match_pipeline_defaults() {
        let cli = Cli::try_parse_from(["tickdash", "etl", "AAPL"]).expect("parse");
        let Command::Etl(args) = cli.command else {
            panic!("expected etl command");
        };

        assert_eq!(args.symbol, "AAPL");
        assert_eq!(args.interval, Interval::FifteenMinutes);
        assert_eq!(args.period, Period::OneMonth);
        assert_eq!(args.store, PathBuf::from("stock_data.duckdb"));
        assert_eq!(args.table, "stock_hourly");
        assert_eq!(args.window, 3);
        assert_eq!(cli.timeout_ms, 10_000);
        assert!(!cli.pretty);
    }

    #[test]
    fn global_flags_follow_subcommand() {
        let cli = Cli::try_parse_from([
            "tickdash", "fetch", "msft", "--interval", "1h", "--period", "3mo", "--pretty",
            "--timeout-ms", "2500",
        ])
        .expect("parse");

        assert!(cli.pretty);
        assert_eq!(cli.timeout_ms, 2_500);
        let Command::Fetch(args) = cli.command else {
            panic!("expected fetch command");
        };
        assert_eq!(args.interval, Interval::OneHour);
        assert_eq!(args.period, Period::ThreeMonths);
        assert!(!args.raw);
    }

    #[test]
    fn unsupported_interval_is_rejected_at_parse_time() {
        let error = Cli::try_parse_from(["tickdash", "fetch", "AAPL", "--interval", "2h"])
            .expect_err("2h is not offered");
        assert!(error.to_string().contains("2h"));
    }

    #[test]
    fn serve_defaults_to_all_interfaces() {
        let cli = Cli::try_parse_from(["tickdash", "serve"]).expect("parse");
        let Command::Serve(args) = cli.command else {
            panic!("expected serve command");
        };
        assert_eq!(args.host, "0.0.0.0");
        assert_eq!(args.port, 8080);
    }
}
