use serde_json::json;
use tickdash_core::{clean, Fetcher};
use tracing::{info_span, Instrument};
use uuid::Uuid;

use crate::cli::FetchArgs;
use crate::error::CliError;
use crate::output::Report;

pub async fn run(args: &FetchArgs, fetcher: &Fetcher, run_id: Uuid) -> Result<Report, CliError> {
    let raw = fetcher
        .fetch(&args.symbol, args.interval, args.period)
        .instrument(info_span!("fetch", %run_id))
        .await?;

    let (data, empty) = if args.raw {
        let empty = raw.is_empty();
        (json!({ "raw": true, "series": raw }), empty)
    } else {
        let series = clean(raw);
        let empty = series.is_empty();
        (json!({ "raw": false, "series": series }), empty)
    };

    let report = Report::new(run_id, "fetch", fetcher.source_id(), data);
    if empty {
        return Ok(report.with_warning(format!(
            "no rows returned for {} ({} over {})",
            args.symbol.trim().to_uppercase(),
            args.interval.as_str(),
            args.period.as_str()
        )));
    }
    Ok(report)
}
