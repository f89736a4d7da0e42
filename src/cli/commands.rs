use clap::Subcommand;

use super::check_config::CheckConfigArgs;
use super::evaluate::EvaluateArgs;
use super::keygen::KeygenArgs;
use super::serve::ServeArgs;
use super::sign::SignArgs;

#[derive(Subcommand, Clone)]
pub enum Commands {
    /// Serve the authorization gateway over HTTP
    Serve(ServeArgs),

    /// Load and validate a configuration file
    CheckConfig(CheckConfigArgs),

    /// Generate an Ed25519 key pair for an agent
    Keygen(KeygenArgs),

    /// Print the headers an agent must send for one request
    Sign(SignArgs),

    /// Run the execution firewall offline on one request
    Evaluate(EvaluateArgs),

    /// Show version and build information
    Version,
}
