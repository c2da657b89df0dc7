/// Salon (tenant) model
///
/// A salon is the unit of tenant isolation: every tenant-partition row
/// carries its `salon_id`. Salons are never deleted; the super-admin moves
/// them between statuses instead.
///
/// # State Machine
///
/// ```text
/// pending   → active | inactive
/// active    → suspended | inactive
/// suspended → active | inactive
/// inactive  (terminal)
/// ```

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Salon account status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SalonStatus {
    /// Registered, waiting for approval
    Pending,

    /// Operating normally
    Active,

    /// Temporarily blocked by a super-admin
    Suspended,

    /// Closed for good
    Inactive,
}

impl SalonStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SalonStatus::Pending => "pending",
            SalonStatus::Active => "active",
            SalonStatus::Suspended => "suspended",
            SalonStatus::Inactive => "inactive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(SalonStatus::Pending),
            "active" => Some(SalonStatus::Active),
            "suspended" => Some(SalonStatus::Suspended),
            "inactive" => Some(SalonStatus::Inactive),
            _ => None,
        }
    }

    pub fn can_transition_to(&self, target: SalonStatus) -> bool {
        match (self, target) {
            (SalonStatus::Pending, SalonStatus::Active) => true,
            (SalonStatus::Pending, SalonStatus::Inactive) => true,

            (SalonStatus::Active, SalonStatus::Suspended) => true,
            (SalonStatus::Active, SalonStatus::Inactive) => true,

            (SalonStatus::Suspended, SalonStatus::Active) => true,
            (SalonStatus::Suspended, SalonStatus::Inactive) => true,

            _ => false,
        }
    }
}

/// Salon
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Salon {
    pub id: Uuid,

    pub name: String,

    /// Owning user (platform partition)
    pub owner_user_id: Uuid,

    pub status: String,

    /// IANA timezone name used for display
    pub timezone: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Model for Salon {
    const KIND: EntityKind = EntityKind::Salon;
    const TABLE: &'static str = "salons";
}

/// Input for creating a salon
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSalon {
    #[validate(length(min = 1, max = 255, message = "Salon name must be 1-255 characters"))]
    pub name: String,

    pub owner_user_id: Uuid,

    #[validate(length(min = 1, max = 64, message = "Timezone must be 1-64 characters"))]
    pub timezone: String,
}

impl Salon {
    pub fn get_status(&self) -> Option<SalonStatus> {
        SalonStatus::from_str(&self.status)
    }

    /// Creates a salon in `pending` status
    pub async fn create(pool: &PgPool, data: CreateSalon) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Salon>(
            r#"
            INSERT INTO salons (name, owner_user_id, timezone)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.name)
        .bind(data.owner_user_id)
        .bind(data.timezone)
        .fetch_one(pool)
        .await
    }

    /// Moves a salon from `from` to `to`
    ///
    /// Returns `None` when the salon is no longer in `from`.
    pub async fn transition(
        pool: &PgPool,
        id: Uuid,
        from: SalonStatus,
        to: SalonStatus,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Salon>(
            r#"
            UPDATE salons
            SET status = $3, updated_at = NOW()
            WHERE id = $1 AND status = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(pool)
        .await
    }

    /// Lists salons, newest first, optionally filtered by status
    pub async fn list(
        pool: &PgPool,
        status: Option<SalonStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Salon>(
            r#"
            SELECT * FROM salons
            WHERE ($1::text IS NULL OR status = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(status.map(|s| s.as_str()))
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
