use anyhow::Result;

use super::check_config::cmd_check_config;
use super::commands::Commands;
use super::env::CliArgs;
use super::evaluate::cmd_evaluate;
use super::keygen::cmd_keygen;
use super::serve::cmd_serve;
use super::sign::cmd_sign;
use super::version::cmd_version;

pub async fn dispatch(cli: &CliArgs) -> Result<()> {
    match cli.command.clone() {
        Commands::Serve(args) => cmd_serve(args).await,
        Commands::CheckConfig(args) => cmd_check_config(args),
        Commands::Keygen(args) => cmd_keygen(args),
        Commands::Sign(args) => cmd_sign(args),
        Commands::Evaluate(args) => cmd_evaluate(args).await,
        Commands::Version => cmd_version(),
    }
}
