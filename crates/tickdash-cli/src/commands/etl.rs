//! `tickdash etl`: fetch, clean, resample, add a moving average, load.

use serde_json::json;
use tickdash_core::{clean_and_transform_with, load, Fetcher};
use tracing::{info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::cli::EtlArgs;
use crate::error::CliError;
use crate::output::Report;

pub async fn run(args: &EtlArgs, fetcher: &Fetcher, run_id: Uuid) -> Result<Report, CliError> {
    let span = info_span!("etl", %run_id, ticker = %args.symbol);
    let raw = fetcher
        .fetch(&args.symbol, args.interval, args.period)
        .instrument(span.clone())
        .await?;
    let _entered = span.enter();

    let fetched_rows = raw.len();
    let symbol = raw.symbol.clone();
    let hourly = clean_and_transform_with(raw, args.window)?;
    info!(
        fetched_rows,
        buckets = hourly.len(),
        window = args.window,
        "transformed {symbol} into hourly buckets"
    );

    let loaded = load(&hourly, &args.store, &args.table)?;

    let report = Report::new(
        run_id,
        "etl",
        fetcher.source_id(),
        json!({
            "ticker": symbol,
            "interval": args.interval,
            "period": args.period,
            "fetched_rows": fetched_rows,
            "hourly_buckets": hourly.len(),
            "moving_average_window": args.window,
            "load": loaded,
        }),
    );

    if hourly.is_empty() {
        warn!("no rows survived cleaning; table '{}' is now empty", args.table);
        return Ok(report.with_warning(format!(
            "no data for {symbol}; table '{}' was replaced with an empty table",
            args.table
        )));
    }
    Ok(report)
}
