/// Per-partition migration runner
///
/// Each partition has its own embedded migration set:
///
/// - `migrations/platform/` - users, subscriptions, notifications
/// - `migrations/tenant/` - salons, staff, customers, services, appointments, invoices
///
/// Files follow the sqlx convention `{version}_{name}.sql`.
///
/// # Example
///
/// ```no_run
/// use salonhub_shared::db::migrations::{migration_status, run_all_migrations};
/// use salonhub_shared::db::partition::{Partition, PartitionPools};
///
/// # async fn example(pools: PartitionPools) -> Result<(), Box<dyn std::error::Error>> {
/// run_all_migrations(&pools).await?;
///
/// let status = migration_status(pools.tenant(), Partition::Tenant).await?;
/// println!("Tenant partition at version {:?}", status.latest_version);
/// # Ok(())
/// # }
/// ```

use crate::db::partition::{Partition, PartitionPools};
use sqlx::migrate::{MigrateError, Migrator};
use sqlx::postgres::PgPool;
use tracing::{debug, info, warn};

static PLATFORM_MIGRATIONS: Migrator = sqlx::migrate!("./migrations/platform");
static TENANT_MIGRATIONS: Migrator = sqlx::migrate!("./migrations/tenant");

/// Migration status of one partition
#[derive(Debug, Clone)]
pub struct MigrationStatus {
    /// Partition the status belongs to
    pub partition: Partition,

    /// Number of migrations successfully applied
    pub applied_migrations: usize,

    /// Number of migrations embedded in this build
    pub known_migrations: usize,

    /// Latest applied version
    pub latest_version: Option<i64>,

    /// Whether every embedded migration has been applied
    pub is_up_to_date: bool,
}

/// Embedded migrator for a partition
pub fn migrator(partition: Partition) -> &'static Migrator {
    match partition {
        Partition::Platform => &PLATFORM_MIGRATIONS,
        Partition::Tenant => &TENANT_MIGRATIONS,
    }
}

/// Applies pending migrations to one partition
///
/// # Errors
///
/// Returns an error if a migration fails or the database is unreachable.
pub async fn run_migrations(pool: &PgPool, partition: Partition) -> Result<(), MigrateError> {
    info!(partition = %partition, "Running database migrations");

    match migrator(partition).run(pool).await {
        Ok(()) => {
            info!(partition = %partition, "Database migrations completed");
            Ok(())
        }
        Err(e) => {
            warn!(partition = %partition, error = %e, "Migration failed");
            Err(e)
        }
    }
}

/// Applies pending migrations to both partitions, platform first
///
/// # Errors
///
/// Stops at the first failing partition.
pub async fn run_all_migrations(pools: &PartitionPools) -> Result<(), MigrateError> {
    for partition in Partition::ALL {
        run_migrations(pools.get(partition), partition).await?;
    }
    Ok(())
}

/// Reports how far a partition's schema has been migrated
///
/// # Errors
///
/// Returns an error if the migrations table cannot be queried.
pub async fn migration_status(
    pool: &PgPool,
    partition: Partition,
) -> Result<MigrationStatus, sqlx::Error> {
    debug!(partition = %partition, "Checking migration status");

    let known_migrations = migrator(partition).iter().count();

    let table_exists: bool = sqlx::query_scalar(
        "SELECT EXISTS (
            SELECT FROM information_schema.tables
            WHERE table_schema = current_schema()
            AND table_name = '_sqlx_migrations'
        )",
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        debug!(partition = %partition, "Migrations table does not exist yet");
        return Ok(MigrationStatus {
            partition,
            applied_migrations: 0,
            known_migrations,
            latest_version: None,
            is_up_to_date: known_migrations == 0,
        });
    }

    let (count, latest_version): (i64, Option<i64>) = sqlx::query_as(
        "SELECT COUNT(*), MAX(version) FROM _sqlx_migrations WHERE success = true",
    )
    .fetch_one(pool)
    .await?;

    let applied_migrations = count as usize;

    Ok(MigrationStatus {
        partition,
        applied_migrations,
        known_migrations,
        latest_version,
        is_up_to_date: applied_migrations >= known_migrations,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_both_partitions_embed_migrations() {
        assert!(migrator(Partition::Platform).iter().count() > 0);
        assert!(migrator(Partition::Tenant).iter().count() > 0);
    }

    #[test]
    fn test_tenant_schema_carries_overlap_constraint() {
        let has_constraint = migrator(Partition::Tenant)
            .iter()
            .any(|m| m.sql.contains("appointments_no_staff_overlap"));
        assert!(has_constraint);
    }
}
