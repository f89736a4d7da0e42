use anyhow::{Context, Result};
use clap::Args;
use payguard_agent_auth::generate_keypair;
use serde_json::json;

#[derive(Args, Clone)]
pub struct KeygenArgs {
    /// Key id to publish in the registry
    #[arg(long)]
    pub kid: String,

    /// Agent that will own the key (defaults to the key id)
    #[arg(long = "agent-id")]
    pub agent_id: Option<String>,
}

/// Prints the secret for the agent and a ready-to-paste `auth.keys` entry for the gateway.
pub fn cmd_keygen(args: KeygenArgs) -> Result<()> {
    let pair = generate_keypair();
    let agent_id = args.agent_id.unwrap_or_else(|| args.kid.clone());
    let output = json!({
        "kid": args.kid,
        "secret_key": pair.secret_key.as_str(),
        "public_key": pair.public_key,
        "registry_entry": {
            "key_id": args.kid,
            "agent_id": agent_id,
            "public_key": pair.public_key,
            "status": "active",
        },
    });
    let rendered = serde_json::to_string_pretty(&output).context("rendering key pair")?;
    println!("{rendered}");
    Ok(())
}
