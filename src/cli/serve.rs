use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Args;
use payguard_core_types::SystemClock;
use payguard_execution_firewall::ExecutionFirewall;
use tokio::net::TcpListener;
use tokio::time::interval;
use tracing::{debug, info, warn};

use crate::audit::TracingAuditSink;
use crate::config::GatewayConfig;
use crate::server::{build_router, GatewayState};

#[derive(Args, Clone)]
pub struct ServeArgs {
    /// Gateway configuration file (YAML or JSON)
    #[arg(short, long, value_name = "FILE")]
    pub config: PathBuf,

    /// Override the listen address from the configuration
    #[arg(long, value_name = "ADDR")]
    pub bind: Option<String>,
}

pub async fn cmd_serve(args: ServeArgs) -> Result<()> {
    let mut config = GatewayConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    if let Some(bind) = args.bind {
        config.server.bind = bind;
    }

    let state = GatewayState::from_config(
        &config,
        Arc::new(SystemClock),
        Arc::new(TracingAuditSink),
    )
    .context("building gateway state")?;

    if config.server.prune_interval_seconds > 0 {
        spawn_pruner(
            state.firewall.clone(),
            Duration::from_secs(config.server.prune_interval_seconds),
        );
    }

    let app = build_router(state, config.server.cors_permissive);
    let listener = TcpListener::bind(&config.server.bind)
        .await
        .with_context(|| format!("binding {}", config.server.bind))?;
    info!(
        addr = %listener.local_addr().context("reading listen address")?,
        auth_enabled = config.auth.enabled,
        "payguard listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving HTTP")?;
    info!("payguard stopped");
    Ok(())
}

fn spawn_pruner(firewall: Arc<ExecutionFirewall>, every: Duration) {
    tokio::spawn(async move {
        let mut ticker = interval(every);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let (windows, days) = firewall.prune();
            debug!(windows, days, "pruned firewall state");
        }
    });
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        warn!(?err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
