/// Start-up sequence
///
/// ```text
/// connect both partitions ─► run migrations (optional) ─► AppState ─► health
/// ```

use crate::app::AppState;
use crate::config::Config;
use salonhub_shared::db::migrations::{migration_status, run_all_migrations};
use salonhub_shared::db::partition::{Partition, PartitionPools};
use tracing::{info, warn};

/// Connects, migrates and wires the application
pub async fn start(config: Config) -> anyhow::Result<AppState> {
    let pools = PartitionPools::connect(
        &config.database.platform_pool(),
        &config.database.tenant_pool(),
    )
    .await?;
    info!("Connected to platform and tenant partitions");

    if config.database.run_migrations {
        run_all_migrations(&pools).await?;
    } else {
        info!("RUN_MIGRATIONS=false, skipping migrations");
    }

    for partition in Partition::ALL {
        let status = migration_status(pools.get(partition), partition).await?;
        if status.is_up_to_date {
            info!(
                partition = %partition,
                latest_version = ?status.latest_version,
                "Schema up to date"
            );
        } else {
            warn!(
                partition = %partition,
                applied = status.applied_migrations,
                known = status.known_migrations,
                "Schema is behind the embedded migrations"
            );
        }
    }

    let state = AppState::new(pools, config);

    let health = state.health().await;
    if health.is_healthy() {
        info!("Both partitions healthy");
    } else {
        warn!(
            platform = health.platform,
            tenant = health.tenant,
            "Partition health check failed"
        );
    }

    Ok(state)
}

/// Closes both partitions' pools
pub async fn shutdown(state: &AppState) {
    state.pools().close().await;
    info!("Shutdown complete");
}
