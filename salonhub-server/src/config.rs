/// Configuration management for the SalonHub server
///
/// Loads configuration from environment variables (after reading `.env` if
/// present) into a type-safe struct.
///
/// # Environment Variables
///
/// - `PLATFORM_DATABASE_URL`: Platform partition connection string (required)
/// - `TENANT_DATABASE_URL`: Tenant partition connection string (required)
/// - `DATABASE_MAX_CONNECTIONS`: Pool size per partition (default: 10)
/// - `DATABASE_MIN_CONNECTIONS`: Warm connections per partition (default: 2)
/// - `DATABASE_CONNECT_TIMEOUT_SECONDS`: Acquire timeout (default: 30)
/// - `RUN_MIGRATIONS`: Apply migrations at start-up (default: true)
/// - `BILLING_TAX_RATE_BPS`: Tax rate in basis points, at most 10000 (default: 0)
/// - `TRIAL_DAYS`: Trial length for new salons (default: 14, at most 3650)
/// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
/// - `RUST_LOG`: Log filter (default: salonhub_server=debug,salonhub_shared=debug)
///
/// # Example
///
/// ```no_run
/// use salonhub_server::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Tax rate: {} bps", config.billing.tax_rate_bps);
/// # Ok(())
/// # }
/// ```

use salonhub_shared::db::pool::PoolConfig;
use salonhub_shared::services::tenant_admin::{DEFAULT_TRIAL_DAYS, MAX_TRIAL_DAYS};
use serde::{Deserialize, Serialize};
use std::env;
use std::str::FromStr;

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Database configuration for both partitions
    pub database: DatabaseConfig,

    /// Billing configuration
    pub billing: BillingConfig,

    /// Salon onboarding configuration
    pub tenancy: TenancyConfig,

    /// Log output format
    pub log_format: LogFormat,
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Platform partition URL (users, subscriptions, notifications)
    pub platform_url: String,

    /// Tenant partition URL (salons and everything inside them)
    pub tenant_url: String,

    /// Maximum number of connections per partition
    pub max_connections: u32,

    /// Minimum number of connections per partition
    pub min_connections: u32,

    /// Connection acquire timeout in seconds
    pub connect_timeout_seconds: u64,

    /// Apply embedded migrations at start-up
    pub run_migrations: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BillingConfig {
    /// Tax rate in basis points (100 = 1%)
    pub tax_rate_bps: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenancyConfig {
    /// Trial length granted to newly registered salons
    pub trial_days: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            other => anyhow::bail!("LOG_FORMAT must be 'pretty' or 'json', got '{}'", other),
        }
    }
}

/// Parses an optional variable, falling back to `default`
fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{} has an invalid value '{}': {}", key, raw, e)),
        None => Ok(default),
    }
}

fn required(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> anyhow::Result<String> {
    lookup(key)
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| anyhow::anyhow!("{} environment variable is required", key))
}

impl Config {
    /// Loads configuration from environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - A required variable is missing
    /// - A variable has an invalid value
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let platform_url = required(&lookup, "PLATFORM_DATABASE_URL")?;
        let tenant_url = required(&lookup, "TENANT_DATABASE_URL")?;

        let max_connections = parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", 10u32)?;
        let min_connections = parse_or(&lookup, "DATABASE_MIN_CONNECTIONS", 2u32)?;
        if min_connections > max_connections {
            anyhow::bail!(
                "DATABASE_MIN_CONNECTIONS ({}) cannot exceed DATABASE_MAX_CONNECTIONS ({})",
                min_connections,
                max_connections
            );
        }

        let connect_timeout_seconds =
            parse_or(&lookup, "DATABASE_CONNECT_TIMEOUT_SECONDS", 30u64)?;
        let run_migrations = parse_or(&lookup, "RUN_MIGRATIONS", true)?;

        let tax_rate_bps = parse_or(&lookup, "BILLING_TAX_RATE_BPS", 0u32)?;
        if tax_rate_bps > 10_000 {
            anyhow::bail!("BILLING_TAX_RATE_BPS must be at most 10000, got {}", tax_rate_bps);
        }

        let trial_days = parse_or(&lookup, "TRIAL_DAYS", DEFAULT_TRIAL_DAYS)?;
        if !(0..=MAX_TRIAL_DAYS).contains(&trial_days) {
            anyhow::bail!(
                "TRIAL_DAYS must be between 0 and {}, got {}",
                MAX_TRIAL_DAYS,
                trial_days
            );
        }

        let log_format = parse_or(&lookup, "LOG_FORMAT", LogFormat::Pretty)?;

        Ok(Self {
            database: DatabaseConfig {
                platform_url,
                tenant_url,
                max_connections,
                min_connections,
                connect_timeout_seconds,
                run_migrations,
            },
            billing: BillingConfig { tax_rate_bps },
            tenancy: TenancyConfig { trial_days },
            log_format,
        })
    }
}

impl DatabaseConfig {
    fn pool_config(&self, url: &str) -> PoolConfig {
        PoolConfig {
            url: url.to_string(),
            max_connections: self.max_connections,
            min_connections: self.min_connections,
            connect_timeout_seconds: self.connect_timeout_seconds,
            ..Default::default()
        }
    }

    pub fn platform_pool(&self) -> PoolConfig {
        self.pool_config(&self.platform_url)
    }

    pub fn tenant_pool(&self) -> PoolConfig {
        self.pool_config(&self.tenant_url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const URLS: [(&str, &str); 2] = [
        ("PLATFORM_DATABASE_URL", "postgresql://localhost/salonhub_platform"),
        ("TENANT_DATABASE_URL", "postgresql://localhost/salonhub_tenant"),
    ];

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&URLS)).unwrap();

        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.database.min_connections, 2);
        assert_eq!(config.database.connect_timeout_seconds, 30);
        assert!(config.database.run_migrations);
        assert_eq!(config.billing.tax_rate_bps, 0);
        assert_eq!(config.tenancy.trial_days, 14);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_overrides() {
        let mut vars = URLS.to_vec();
        vars.extend([
            ("DATABASE_MAX_CONNECTIONS", "20"),
            ("RUN_MIGRATIONS", "false"),
            ("BILLING_TAX_RATE_BPS", "825"),
            ("TRIAL_DAYS", "30"),
            ("LOG_FORMAT", "JSON"),
        ]);
        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert_eq!(config.database.max_connections, 20);
        assert!(!config.database.run_migrations);
        assert_eq!(config.billing.tax_rate_bps, 825);
        assert_eq!(config.tenancy.trial_days, 30);
        assert_eq!(config.log_format, LogFormat::Json);

        let mut vars = URLS.to_vec();
        vars.push(("TRIAL_DAYS", "3650"));
        assert_eq!(Config::from_lookup(lookup(&vars)).unwrap().tenancy.trial_days, 3650);
    }

    #[test]
    fn test_partition_urls_are_required() {
        let err = Config::from_lookup(lookup(&URLS[..1])).unwrap_err();
        assert!(err.to_string().contains("TENANT_DATABASE_URL"));

        let err = Config::from_lookup(lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("PLATFORM_DATABASE_URL"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for (key, value) in [
            ("DATABASE_MAX_CONNECTIONS", "many"),
            ("BILLING_TAX_RATE_BPS", "10001"),
            ("TRIAL_DAYS", "-1"),
            ("TRIAL_DAYS", "3651"),
            ("TRIAL_DAYS", "1000000000000"),
            ("LOG_FORMAT", "xml"),
            ("DATABASE_MIN_CONNECTIONS", "50"),
        ] {
            let mut vars = URLS.to_vec();
            vars.push((key, value));
            assert!(Config::from_lookup(lookup(&vars)).is_err(), "{}={}", key, value);
        }
    }

    #[test]
    fn test_pool_configs_share_limits() {
        let config = Config::from_lookup(lookup(&URLS)).unwrap();

        let platform = config.database.platform_pool();
        let tenant = config.database.tenant_pool();

        assert_eq!(platform.url, "postgresql://localhost/salonhub_platform");
        assert_eq!(tenant.url, "postgresql://localhost/salonhub_tenant");
        assert_eq!(platform.max_connections, tenant.max_connections);
    }
}
