/// Application state
///
/// Everything the process shares: the model router, the services built on
/// it and the configuration. Built once at start-up; cloning is cheap since
/// every member is behind an `Arc` or is itself a handle.
///
/// # Example
///
/// ```no_run
/// use salonhub_server::{app::AppState, config::Config};
/// use salonhub_shared::db::partition::PartitionPools;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pools = PartitionPools::connect(
///     &config.database.platform_pool(),
///     &config.database.tenant_pool(),
/// )
/// .await?;
/// let state = AppState::new(pools, config);
/// # Ok(())
/// # }
/// ```

use crate::config::Config;
use salonhub_shared::capabilities::{ManualPaymentProcessor, OutboxNotifier};
use salonhub_shared::db::partition::{PartitionHealth, PartitionPools};
use salonhub_shared::db::router::ModelRouter;
use salonhub_shared::models::notification::Notification;
use salonhub_shared::scheduling::PgBookingStore;
use salonhub_shared::services::{AppointmentService, BillingService, TenantAdminService};
use std::sync::Arc;

/// Appointment service as wired in production
pub type Appointments = AppointmentService<PgBookingStore, OutboxNotifier>;

/// Billing service as wired in production
pub type Billing = BillingService<ManualPaymentProcessor>;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Tenant-aware model router
    pub router: Arc<ModelRouter>,

    pub appointments: Appointments,

    pub tenant_admin: TenantAdminService,

    pub billing: Billing,

    /// Application configuration
    pub config: Arc<Config>,
}

impl AppState {
    /// Wires services onto the partitions
    pub fn new(pools: PartitionPools, config: Config) -> Self {
        let router = Arc::new(ModelRouter::new(pools));

        let notifier = Arc::new(OutboxNotifier::new(router.bind::<Notification>()));
        let appointments =
            AppointmentService::new(Arc::new(PgBookingStore::new(&router)), notifier);

        let tenant_admin = TenantAdminService::new(&router, config.tenancy.trial_days);

        let billing = BillingService::new(
            &router,
            Arc::new(ManualPaymentProcessor::new()),
            config.billing.tax_rate_bps,
        );

        Self {
            router,
            appointments,
            tenant_admin,
            billing,
            config: Arc::new(config),
        }
    }

    pub fn pools(&self) -> &PartitionPools {
        self.router.pools()
    }

    /// Pings both partitions
    pub async fn health(&self) -> PartitionHealth {
        self.pools().health().await
    }
}
