/// Common test utilities for integration tests
///
/// Boots the full application against the databases named by
/// PLATFORM_DATABASE_URL and TENANT_DATABASE_URL, then seeds one approved
/// salon with a stylist, a customer and a service.

use chrono::Utc;
use salonhub_server::app::AppState;
use salonhub_server::bootstrap;
use salonhub_server::config::Config;
use salonhub_shared::models::customer::{CreateCustomer, Customer};
use salonhub_shared::models::service::{CreateService, SalonService};
use salonhub_shared::models::staff::{CreateStaff, Staff};
use salonhub_shared::models::subscription::SubscriptionPlan;
use salonhub_shared::services::RegisterSalon;
use uuid::Uuid;

/// Test context containing the wired application and seeded rows
pub struct TestContext {
    pub state: AppState,
    pub salon_id: Uuid,
    pub staff: Staff,
    pub customer: Customer,
    pub service: SalonService,
}

impl TestContext {
    pub async fn new() -> anyhow::Result<Self> {
        let config = Config::from_env()?;
        let state = bootstrap::start(config).await?;

        let registered = state
            .tenant_admin
            .register_salon(
                RegisterSalon {
                    salon_name: format!("Test Salon {}", Uuid::new_v4()),
                    timezone: "Europe/Lisbon".to_string(),
                    owner_email: format!("owner-{}@example.com", Uuid::new_v4()),
                    owner_name: "Test Owner".to_string(),
                    plan: SubscriptionPlan::Basic,
                },
                Utc::now(),
            )
            .await?;
        let salon_id = registered.salon.id;
        state.tenant_admin.approve_salon(salon_id).await?;

        let tenant = state.pools().tenant();
        let staff = Staff::create(
            tenant,
            CreateStaff {
                salon_id,
                name: "Test Stylist".to_string(),
                email: None,
            },
        )
        .await?;
        let customer = Customer::create(
            tenant,
            CreateCustomer {
                salon_id,
                name: "Test Customer".to_string(),
                email: Some(format!("customer-{}@example.com", Uuid::new_v4())),
                phone: None,
            },
        )
        .await?;
        let service = SalonService::create(
            tenant,
            CreateService {
                salon_id,
                name: "Colour".to_string(),
                duration_minutes: 90,
                price_cents: 12000,
            },
        )
        .await?;

        Ok(Self {
            state,
            salon_id,
            staff,
            customer,
            service,
        })
    }

    pub async fn cleanup(self) {
        bootstrap::shutdown(&self.state).await;
    }
}
