/// Super-admin operations over salons and their subscriptions
///
/// Registration spans both partitions: the owner and the subscription live
/// in the platform partition, the salon in the tenant partition. There is no
/// cross-partition transaction. Writes go owner, salon, subscription; an
/// owner left behind by a failed registration is reused on retry. A salon
/// whose subscription insert fails is logged at `error`.

use crate::db::router::{ModelHandle, ModelRouter};
use crate::error::{stored_status, ServiceError, ServiceResult};
use crate::models::salon::{CreateSalon, Salon, SalonStatus};
use crate::models::subscription::{
    CreateSubscription, Subscription, SubscriptionPlan, SubscriptionStatus, BILLING_PERIOD_DAYS,
};
use crate::models::user::{CreateUser, User, UserRole};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};
use uuid::Uuid;
use validator::Validate;

/// Default trial length for new salons
pub const DEFAULT_TRIAL_DAYS: i64 = 14;

/// Longest configurable trial (ten years)
pub const MAX_TRIAL_DAYS: i64 = 3650;

/// Largest page `list_salons` returns
pub const MAX_PAGE_SIZE: i64 = 100;

/// Salon sign-up request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RegisterSalon {
    #[validate(length(min = 1, max = 255, message = "Salon name must be 1-255 characters"))]
    pub salon_name: String,

    #[validate(length(min = 1, max = 64, message = "Timezone must be 1-64 characters"))]
    pub timezone: String,

    #[validate(email(message = "Invalid email format"))]
    pub owner_email: String,

    #[validate(length(min = 1, max = 255, message = "Owner name must be 1-255 characters"))]
    pub owner_name: String,

    pub plan: SubscriptionPlan,
}

/// Everything created by a registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisteredSalon {
    pub owner: User,
    pub salon: Salon,
    pub subscription: Subscription,

    /// False when the owner already had an account
    pub owner_created: bool,
}

#[derive(Debug, Clone)]
pub struct TenantAdminService {
    users: ModelHandle<User>,
    salons: ModelHandle<Salon>,
    subscriptions: ModelHandle<Subscription>,
    trial_days: i64,
}

/// Checks a salon status change against the state machine
pub fn check_salon_transition(from: SalonStatus, to: SalonStatus) -> ServiceResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition {
            entity: "salon",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// Checks a subscription status change against the state machine
pub fn check_subscription_transition(
    from: SubscriptionStatus,
    to: SubscriptionStatus,
) -> ServiceResult<()> {
    if from.can_transition_to(to) {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition {
            entity: "subscription",
            from: from.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

/// End of a trial of `trial_days` starting at `now`
pub fn trial_end(now: DateTime<Utc>, trial_days: i64) -> ServiceResult<DateTime<Utc>> {
    if !(0..=MAX_TRIAL_DAYS).contains(&trial_days) {
        return Err(ServiceError::validation(
            "trial_days",
            format!("Trial length must be between 0 and {} days", MAX_TRIAL_DAYS),
        ));
    }
    now.checked_add_signed(Duration::days(trial_days))
        .ok_or_else(|| ServiceError::validation("now", "Trial would end past the calendar limit"))
}

/// End of the billing period that starts at `now` when `to` is `active`
pub fn period_end(
    now: DateTime<Utc>,
    to: SubscriptionStatus,
) -> ServiceResult<Option<DateTime<Utc>>> {
    if to != SubscriptionStatus::Active {
        return Ok(None);
    }
    now.checked_add_signed(Duration::days(BILLING_PERIOD_DAYS))
        .map(Some)
        .ok_or_else(|| {
            ServiceError::validation("now", "Billing period would end past the calendar limit")
        })
}

/// Clamps a page request to `1..=MAX_PAGE_SIZE` and a non-negative offset
pub fn page(limit: i64, offset: i64) -> (i64, i64) {
    (limit.clamp(1, MAX_PAGE_SIZE), offset.max(0))
}

impl TenantAdminService {
    pub fn new(router: &ModelRouter, trial_days: i64) -> Self {
        Self {
            users: router.bind::<User>(),
            salons: router.bind::<Salon>(),
            subscriptions: router.bind::<Subscription>(),
            trial_days,
        }
    }

    pub fn trial_days(&self) -> i64 {
        self.trial_days
    }

    /// Creates (or reuses) the owner, a `pending` salon and a trial
    pub async fn register_salon(
        &self,
        request: RegisterSalon,
        now: DateTime<Utc>,
    ) -> ServiceResult<RegisteredSalon> {
        request.validate()?;
        let trial_ends_at = trial_end(now, self.trial_days)?;

        let (owner, owner_created) = User::find_or_create(
            self.users.pool(),
            CreateUser {
                email: request.owner_email,
                name: request.owner_name,
                role: UserRole::SalonOwner,
            },
        )
        .await?;

        let salon = Salon::create(
            self.salons.pool(),
            CreateSalon {
                name: request.salon_name,
                owner_user_id: owner.id,
                timezone: request.timezone,
            },
        )
        .await?;

        let subscription = Subscription::create_trial(
            self.subscriptions.pool(),
            CreateSubscription {
                salon_id: salon.id,
                plan: request.plan,
                trial_ends_at,
            },
        )
        .await
        .map_err(|e| {
            error!(salon_id = %salon.id, error = %e, "Salon created without subscription");
            ServiceError::from(e)
        })?;

        info!(
            salon_id = %salon.id,
            owner_id = %owner.id,
            owner_created,
            plan = request.plan.as_str(),
            trial_ends_at = ?subscription.trial_ends_at,
            "Salon registered"
        );

        Ok(RegisteredSalon {
            owner,
            salon,
            subscription,
            owner_created,
        })
    }

    pub async fn get_salon(&self, salon_id: Uuid) -> ServiceResult<Salon> {
        self.salons
            .find_by_id(salon_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Salon", salon_id))
    }

    pub async fn approve_salon(&self, salon_id: Uuid) -> ServiceResult<Salon> {
        self.set_salon_status(salon_id, SalonStatus::Active).await
    }

    pub async fn suspend_salon(&self, salon_id: Uuid) -> ServiceResult<Salon> {
        self.set_salon_status(salon_id, SalonStatus::Suspended).await
    }

    pub async fn reactivate_salon(&self, salon_id: Uuid) -> ServiceResult<Salon> {
        self.set_salon_status(salon_id, SalonStatus::Active).await
    }

    pub async fn deactivate_salon(&self, salon_id: Uuid) -> ServiceResult<Salon> {
        self.set_salon_status(salon_id, SalonStatus::Inactive).await
    }

    async fn set_salon_status(&self, salon_id: Uuid, to: SalonStatus) -> ServiceResult<Salon> {
        let salon = self.get_salon(salon_id).await?;
        let from = stored_status(&salon.status, salon.get_status(), "Salon")?;
        check_salon_transition(from, to)?;

        let updated = Salon::transition(self.salons.pool(), salon_id, from, to)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!("Salon {} was modified concurrently", salon_id))
            })?;

        info!(salon_id = %salon_id, from = from.as_str(), to = to.as_str(), "Salon status changed");
        Ok(updated)
    }

    pub async fn get_subscription(&self, salon_id: Uuid) -> ServiceResult<Subscription> {
        Subscription::find_by_salon(self.subscriptions.pool(), salon_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Subscription for salon", salon_id))
    }

    pub async fn set_subscription_status(
        &self,
        salon_id: Uuid,
        to: SubscriptionStatus,
        now: DateTime<Utc>,
    ) -> ServiceResult<Subscription> {
        let subscription = self.get_subscription(salon_id).await?;
        let from = stored_status(
            &subscription.status,
            subscription.get_status(),
            "Subscription",
        )?;
        check_subscription_transition(from, to)?;
        let period_end = period_end(now, to)?;

        let updated =
            Subscription::transition(self.subscriptions.pool(), salon_id, from, to, period_end)
                .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!(
                    "Subscription of salon {} was modified concurrently",
                    salon_id
                ))
            })?;

        info!(
            salon_id = %salon_id,
            from = from.as_str(),
            to = to.as_str(),
            "Subscription status changed"
        );
        Ok(updated)
    }

    /// Expires every trial that ended before `now`; returns how many
    pub async fn expire_trials(&self, now: DateTime<Utc>) -> ServiceResult<u64> {
        let expired = Subscription::expire_trials(self.subscriptions.pool(), now).await?;
        if expired > 0 {
            info!(expired, "Expired trial subscriptions");
        }
        Ok(expired)
    }

    pub async fn list_salons(
        &self,
        status: Option<SalonStatus>,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Salon>> {
        let (limit, offset) = page(limit, offset);
        Ok(Salon::list(self.salons.pool(), status, limit, offset).await?)
    }
}
