use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::config::GatewayConfig;
use crate::server::build_policy_store;

#[derive(Args, Clone)]
pub struct CheckConfigArgs {
    /// Gateway configuration file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,
}

pub fn cmd_check_config(args: CheckConfigArgs) -> Result<()> {
    let config = GatewayConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    payguard_agent_auth::StaticKeyRegistry::from_records(&config.auth.keys)
        .context("auth.keys")?;
    let policies = build_policy_store(&config).context("policies")?;

    println!("configuration OK: {}", args.config.display());
    println!("  bind:              {}", config.server.bind);
    println!(
        "  auth:              {}",
        if config.auth.enabled { "enabled" } else { "DISABLED" }
    );
    println!("  keys:              {}", config.auth.keys.len());
    println!("  allow rules:       {}", config.auth.allow_rules.len());
    println!(
        "  timestamp window:  {}s (replay ttl {}s)",
        config.auth.timestamp_window_seconds,
        config.auth.effective_replay_ttl_seconds()
    );
    println!("  daily budget:      {}", config.firewall.daily_budget);
    println!(
        "  rate limit:        {} per {}s",
        config.firewall.rate_ceiling, config.firewall.rate_window_seconds
    );
    println!("  policies:          {}", policies.len());
    Ok(())
}
