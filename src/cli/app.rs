use anyhow::Result;
use clap::Parser;
use tracing::{debug, error};

use super::dispatch::dispatch;
use super::env::CliArgs;
use super::runtime::init_logging;

pub async fn run() -> Result<()> {
    let cli = CliArgs::parse();

    init_logging(&cli.log_level, cli.debug, cli.log_format)?;
    debug!("payguard v{}", env!("CARGO_PKG_VERSION"));

    match dispatch(&cli).await {
        Ok(()) => Ok(()),
        Err(err) => {
            error!("command failed: {:#}", err);
            Err(err)
        }
    }
}
