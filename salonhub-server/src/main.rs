//! # SalonHub Server
//!
//! Boots the SalonHub core: loads configuration, connects the platform and
//! tenant partitions, applies migrations and holds the wired services until
//! interrupted.
//!
//! ## Usage
//!
//! ```bash
//! PLATFORM_DATABASE_URL=postgresql://localhost/salonhub_platform \
//! TENANT_DATABASE_URL=postgresql://localhost/salonhub_tenant \
//! cargo run -p salonhub-server
//! ```

use salonhub_server::{bootstrap, config::Config, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    telemetry::init(config.log_format)?;

    tracing::info!(
        "SalonHub server v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let state = bootstrap::start(config).await?;

    for (partition, stats) in state.pools().stats() {
        tracing::debug!(
            partition = %partition,
            total = stats.total_connections,
            idle = stats.idle_connections,
            "Pool ready"
        );
    }

    tracing::info!("SalonHub core ready");

    tokio::signal::ctrl_c().await?;
    tracing::info!("Shutdown signal received, exiting...");

    bootstrap::shutdown(&state).await;

    Ok(())
}
