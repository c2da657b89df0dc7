/// Storage partitions
///
/// SalonHub keeps its data in two independently addressable databases:
///
/// - **platform**: accounts, subscriptions and notifications shared across
///   every salon
/// - **tenant**: everything a salon owns (staff, customers, appointments, ...)
///
/// [`PartitionPools`] owns one connection pool per partition. Which entity
/// lives where is decided by [`crate::db::router`].

use crate::db::pool::{self, PoolConfig, PoolStats};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use std::fmt;
use tracing::{info, warn};

/// Logical storage partition
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Partition {
    /// Platform-wide data (users, subscriptions, notifications)
    Platform,

    /// Salon-scoped data
    Tenant,
}

impl Partition {
    pub const ALL: [Partition; 2] = [Partition::Platform, Partition::Tenant];

    pub fn as_str(&self) -> &'static str {
        match self {
            Partition::Platform => "platform",
            Partition::Tenant => "tenant",
        }
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reachability of both partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PartitionHealth {
    pub platform: bool,
    pub tenant: bool,
}

impl PartitionHealth {
    pub fn is_healthy(&self) -> bool {
        self.platform && self.tenant
    }
}

/// One connection pool per partition
///
/// Cloning is cheap: `PgPool` is reference counted.
#[derive(Debug, Clone)]
pub struct PartitionPools {
    platform: PgPool,
    tenant: PgPool,
}

impl PartitionPools {
    /// Wraps already-built pools
    pub fn new(platform: PgPool, tenant: PgPool) -> Self {
        Self { platform, tenant }
    }

    /// Connects to both partitions and health-checks them
    ///
    /// # Errors
    ///
    /// Returns the first connection error encountered.
    pub async fn connect(platform: &PoolConfig, tenant: &PoolConfig) -> Result<Self, sqlx::Error> {
        let (platform, tenant) = futures::future::try_join(
            pool::create_pool(Partition::Platform.as_str(), platform),
            pool::create_pool(Partition::Tenant.as_str(), tenant),
        )
        .await?;

        Ok(Self::new(platform, tenant))
    }

    /// Builds both pools without connecting
    ///
    /// # Errors
    ///
    /// Returns an error if either URL cannot be parsed.
    pub fn connect_lazy(platform: &PoolConfig, tenant: &PoolConfig) -> Result<Self, sqlx::Error> {
        Ok(Self::new(
            pool::create_lazy_pool(Partition::Platform.as_str(), platform)?,
            pool::create_lazy_pool(Partition::Tenant.as_str(), tenant)?,
        ))
    }

    /// Returns the pool owning the given partition
    pub fn get(&self, partition: Partition) -> &PgPool {
        match partition {
            Partition::Platform => &self.platform,
            Partition::Tenant => &self.tenant,
        }
    }

    pub fn platform(&self) -> &PgPool {
        &self.platform
    }

    pub fn tenant(&self) -> &PgPool {
        &self.tenant
    }

    /// Pings both partitions concurrently
    pub async fn health(&self) -> PartitionHealth {
        let (platform, tenant) = futures::future::join(
            pool::health_check(&self.platform),
            pool::health_check(&self.tenant),
        )
        .await;

        if let Err(err) = &platform {
            warn!(partition = "platform", error = %err, "Partition health check failed");
        }
        if let Err(err) = &tenant {
            warn!(partition = "tenant", error = %err, "Partition health check failed");
        }

        PartitionHealth {
            platform: platform.is_ok(),
            tenant: tenant.is_ok(),
        }
    }

    pub fn stats(&self) -> Vec<(Partition, PoolStats)> {
        Partition::ALL
            .iter()
            .map(|partition| (*partition, pool::get_pool_stats(self.get(*partition))))
            .collect()
    }

    /// Closes both pools
    pub async fn close(&self) {
        for partition in Partition::ALL {
            pool::close_pool(partition.as_str(), self.get(partition)).await;
        }
        info!("All partitions closed");
    }
}
