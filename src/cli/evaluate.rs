use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use payguard_core_types::SystemClock;
use payguard_execution_firewall::FirewallRequest;

use crate::config::GatewayConfig;
use crate::server::build_firewall;

#[derive(Args, Clone)]
pub struct EvaluateArgs {
    /// Gateway configuration file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// JSON file holding `{ tx, provider?, now? }`
    #[arg(short, long, value_name = "FILE")]
    pub input: PathBuf,
}

/// One evaluation against fresh in-memory stores; nothing carries over between runs.
pub async fn cmd_evaluate(args: EvaluateArgs) -> Result<()> {
    let config = GatewayConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let raw = std::fs::read_to_string(&args.input)
        .with_context(|| format!("reading {}", args.input.display()))?;
    let request: FirewallRequest = serde_json::from_str(&raw)
        .with_context(|| format!("parsing {}", args.input.display()))?;

    let firewall = build_firewall(&config, Arc::new(SystemClock)).context("building firewall")?;
    let decision = firewall.evaluate(&request).await;
    println!(
        "{}",
        serde_json::to_string_pretty(&decision).context("rendering decision")?
    );
    Ok(())
}
