mod etl;
mod fetch;
mod serve;
mod sql;

use std::time::Instant;

use tickdash_core::Fetcher;
use uuid::Uuid;

use crate::cli::{Cli, Command};
use crate::error::CliError;
use crate::output::Report;

/// Dispatch one command. `serve` runs until stopped and yields no report.
pub async fn run(cli: &Cli) -> Result<Option<Report>, CliError> {
    let run_id = Uuid::new_v4();
    let started = Instant::now();

    let report = match &cli.command {
        Command::Fetch(args) => fetch::run(args, &Fetcher::yahoo(cli.timeout_ms), run_id).await?,
        Command::Etl(args) => etl::run(args, &Fetcher::yahoo(cli.timeout_ms), run_id).await?,
        Command::Sql(args) => sql::run(args, run_id)?,
        Command::Serve(args) => {
            serve::run(args, Fetcher::yahoo(cli.timeout_ms)).await?;
            return Ok(None);
        }
    };

    let latency_ms = u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX);
    Ok(Some(report.with_latency_ms(latency_ms)))
}
