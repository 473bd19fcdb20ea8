use tickdash_core::Fetcher;
use tickdash_web::{serve, ServerConfig};

use crate::cli::ServeArgs;
use crate::error::CliError;

pub async fn run(args: &ServeArgs, fetcher: Fetcher) -> Result<(), CliError> {
    let config = ServerConfig {
        host: args.host.clone(),
        port: args.port,
    };
    serve(config, fetcher).await?;
    Ok(())
}
