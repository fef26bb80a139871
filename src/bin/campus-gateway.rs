use anyhow::{Context, Result};
use campus_gateway::cli::{self, telemetry};
use rustls::crypto::ring;

#[tokio::main]
async fn main() -> Result<()> {
    ring::default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("Failed to install rustls crypto provider"))
        .context("TLS crypto provider initialization failed")?;

    let action = cli::start()?;
    let result = action.execute().await;

    telemetry::shutdown_tracer();

    result
}
