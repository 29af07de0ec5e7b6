//! realeffectd - HTTP daemon serving RealEffect mission evaluation.
//!
//! Configuration comes from `REALEFFECTD_*` environment variables, overridden
//! by the flags below.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use realeffect_service::config::{ConfigOverrides, ServiceConfig};
use realeffect_service::server;
use realeffect_service::LocalBackend;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// realeffectd - RealEffect evaluation daemon
#[derive(Parser, Debug)]
#[command(name = "realeffectd")]
#[command(version = realeffect_core::VERSION, about, long_about = None)]
struct Cli {
    /// Listen address (e.g., 0.0.0.0:8081)
    #[arg(long)]
    addr: Option<String>,

    /// Rule set file overriding the default thresholds
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Per-request timeout (e.g., 30s, 1m)
    #[arg(long)]
    request_timeout: Option<String>,

    /// Largest accepted request body in bytes
    #[arg(long)]
    max_body_bytes: Option<String>,

    /// Log filter; falls back to RUST_LOG, then "info"
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = match &cli.log_level {
        Some(level) => EnvFilter::try_new(level)
            .with_context(|| format!("invalid log filter {:?}", level))?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let config = resolve_config(&cli)?;
    let rules = config.load_rules().context("loading rule set")?;
    tracing::info!(
        min_accepted_ratio = rules.min_accepted_ratio,
        max_weight_per_slot = rules.max_weight_per_slot,
        "rule set loaded"
    );

    server::serve(config, Arc::new(LocalBackend::new(rules)))
        .await
        .context("server failed")
}

fn resolve_config(cli: &Cli) -> Result<ServiceConfig> {
    let overrides = ConfigOverrides {
        addr: cli.addr.clone(),
        request_timeout: cli.request_timeout.clone(),
        max_body_bytes: cli.max_body_bytes.clone(),
        rules: cli.rules.clone(),
    };
    ServiceConfig::from_env_with(&overrides).context("resolving configuration")
}
