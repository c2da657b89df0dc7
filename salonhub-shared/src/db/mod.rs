/// Database layer for SalonHub
///
/// # Modules
///
/// - `pool`: PostgreSQL connection pool management with health checks
/// - `partition`: the platform and tenant partitions and their pools
/// - `router`: entity-kind to partition routing and model handles
/// - `migrations`: embedded per-partition migrations
///
/// # Example
///
/// ```no_run
/// use salonhub_shared::db::partition::PartitionPools;
/// use salonhub_shared::db::pool::PoolConfig;
/// use salonhub_shared::db::router::ModelRouter;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let platform = PoolConfig {
///         url: std::env::var("PLATFORM_DATABASE_URL")?,
///         ..Default::default()
///     };
///     let tenant = PoolConfig {
///         url: std::env::var("TENANT_DATABASE_URL")?,
///         ..Default::default()
///     };
///
///     let pools = PartitionPools::connect(&platform, &tenant).await?;
///     let router = ModelRouter::new(pools);
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod partition;
pub mod pool;
pub mod router;
