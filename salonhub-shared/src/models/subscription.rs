/// Salon subscriptions
///
/// Every salon has exactly one subscription row in the platform partition.
/// `salon_id` points into the tenant partition, so there is no foreign key;
/// the super-admin service keeps both sides in step.
///
/// # State Machine
///
/// ```text
/// trial    → active | cancelled | expired
/// active   → past_due | cancelled
/// past_due → active | cancelled | expired
/// cancelled, expired → active   (re-subscription)
/// ```

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Length of a paid billing period
pub const BILLING_PERIOD_DAYS: i64 = 30;

/// Subscription plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionPlan {
    Basic,
    Professional,
    Enterprise,
}

impl SubscriptionPlan {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionPlan::Basic => "basic",
            SubscriptionPlan::Professional => "professional",
            SubscriptionPlan::Enterprise => "enterprise",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "basic" => Some(SubscriptionPlan::Basic),
            "professional" => Some(SubscriptionPlan::Professional),
            "enterprise" => Some(SubscriptionPlan::Enterprise),
            _ => None,
        }
    }
}

/// Subscription lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    PastDue,
    Cancelled,
    Expired,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubscriptionStatus::Trial => "trial",
            SubscriptionStatus::Active => "active",
            SubscriptionStatus::PastDue => "past_due",
            SubscriptionStatus::Cancelled => "cancelled",
            SubscriptionStatus::Expired => "expired",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "trial" => Some(SubscriptionStatus::Trial),
            "active" => Some(SubscriptionStatus::Active),
            "past_due" => Some(SubscriptionStatus::PastDue),
            "cancelled" => Some(SubscriptionStatus::Cancelled),
            "expired" => Some(SubscriptionStatus::Expired),
            _ => None,
        }
    }

    /// Whether the salon may use the product under this status
    pub fn grants_access(&self) -> bool {
        matches!(
            self,
            SubscriptionStatus::Trial | SubscriptionStatus::Active | SubscriptionStatus::PastDue
        )
    }

    pub fn can_transition_to(&self, target: SubscriptionStatus) -> bool {
        use SubscriptionStatus::*;

        matches!(
            (self, target),
            (Trial, Active)
                | (Trial, Cancelled)
                | (Trial, Expired)
                | (Active, PastDue)
                | (Active, Cancelled)
                | (PastDue, Active)
                | (PastDue, Cancelled)
                | (PastDue, Expired)
                | (Cancelled, Active)
                | (Expired, Active)
        )
    }
}

/// Subscription of one salon
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subscription {
    pub id: Uuid,

    /// Salon (tenant partition) this subscription belongs to
    pub salon_id: Uuid,

    pub plan: String,

    pub status: String,

    /// End of the free trial (None once converted)
    pub trial_ends_at: Option<DateTime<Utc>>,

    /// End of the current paid period
    pub current_period_end: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Model for Subscription {
    const KIND: EntityKind = EntityKind::Subscription;
    const TABLE: &'static str = "subscriptions";
}

/// Input for opening a trial subscription
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateSubscription {
    pub salon_id: Uuid,
    pub plan: SubscriptionPlan,
    pub trial_ends_at: DateTime<Utc>,
}

impl Subscription {
    pub fn get_status(&self) -> Option<SubscriptionStatus> {
        SubscriptionStatus::from_str(&self.status)
    }

    pub fn get_plan(&self) -> Option<SubscriptionPlan> {
        SubscriptionPlan::from_str(&self.plan)
    }

    /// Opens a trial subscription for a salon
    pub async fn create_trial(pool: &PgPool, data: CreateSubscription) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            INSERT INTO subscriptions (salon_id, plan, status, trial_ends_at)
            VALUES ($1, $2, 'trial', $3)
            RETURNING *
            "#,
        )
        .bind(data.salon_id)
        .bind(data.plan.as_str())
        .bind(data.trial_ends_at)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_salon(pool: &PgPool, salon_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE salon_id = $1")
            .bind(salon_id)
            .fetch_optional(pool)
            .await
    }

    /// Moves the subscription from `from` to `to`
    ///
    /// `period_end`, when given, starts a fresh billing period; activation
    /// also closes the trial. Returns `None` if the row is no longer in
    /// `from` (a concurrent change won).
    pub async fn transition(
        pool: &PgPool,
        salon_id: Uuid,
        from: SubscriptionStatus,
        to: SubscriptionStatus,
        period_end: Option<DateTime<Utc>>,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subscription>(
            r#"
            UPDATE subscriptions
            SET status = $3,
                current_period_end = COALESCE($4, current_period_end),
                trial_ends_at = CASE WHEN $3 = 'active' THEN NULL ELSE trial_ends_at END,
                updated_at = NOW()
            WHERE salon_id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(salon_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .bind(period_end)
        .fetch_optional(pool)
        .await
    }

    /// Expires every trial that ended before `now`
    ///
    /// Returns the number of subscriptions expired.
    pub async fn expire_trials(pool: &PgPool, now: DateTime<Utc>) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE subscriptions
            SET status = 'expired', updated_at = NOW()
            WHERE status = 'trial' AND trial_ends_at < $1
            "#,
        )
        .bind(now)
        .execute(pool)
        .await?;

        Ok(result.rows_affected())
    }
}
