use anyhow::{Context, Result};
use clap::ValueEnum;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// `RUST_LOG` wins over `--log-level`; `--debug` wins over both.
pub fn init_logging(level: &str, debug: bool, format: LogFormat) -> Result<()> {
    let filter = if debug {
        EnvFilter::new(tracing::Level::DEBUG.to_string())
    } else {
        let level: tracing::Level = level.parse().context("Invalid log level")?;
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()))
    };

    let registry = tracing_subscriber::registry().with(filter);
    let result = match format {
        LogFormat::Text => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_writer(std::io::stderr),
            )
            .try_init(),
    };
    result.context("Failed to install tracing subscriber")
}
