/// Service catalogue (tenant partition)
///
/// A salon's bookable treatments, each with a duration and a price. An
/// appointment's length defaults to the sum of its services' durations and
/// its invoice subtotal to the sum of their prices.

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// A bookable treatment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct SalonService {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub name: String,
    pub duration_minutes: i32,
    pub price_cents: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for SalonService {
    const KIND: EntityKind = EntityKind::Service;
    const TABLE: &'static str = "services";
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateService {
    pub salon_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(range(min = 1, max = 1440, message = "Duration must be 1-1440 minutes"))]
    pub duration_minutes: i32,

    #[validate(range(min = 0, message = "Price cannot be negative"))]
    pub price_cents: i64,
}

/// Total duration of a set of services
pub fn total_duration(services: &[SalonService]) -> i32 {
    services.iter().map(|s| s.duration_minutes).sum()
}

/// Total price of a set of services
pub fn total_price(services: &[SalonService]) -> i64 {
    services.iter().map(|s| s.price_cents).sum()
}

impl SalonService {
    pub async fn create(pool: &PgPool, data: CreateService) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, SalonService>(
            r#"
            INSERT INTO services (salon_id, name, duration_minutes, price_cents)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.salon_id)
        .bind(data.name)
        .bind(data.duration_minutes)
        .bind(data.price_cents)
        .fetch_one(pool)
        .await
    }

    /// Fetches the listed services of one salon
    ///
    /// Unknown ids and ids of other salons are silently absent from the
    /// result; callers compare lengths.
    pub async fn find_many(
        pool: &PgPool,
        salon_id: Uuid,
        ids: &[Uuid],
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SalonService>(
            "SELECT * FROM services WHERE salon_id = $1 AND id = ANY($2)",
        )
        .bind(salon_id)
        .bind(ids)
        .fetch_all(pool)
        .await
    }

    pub async fn list_by_salon(
        pool: &PgPool,
        salon_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, SalonService>(
            r#"
            SELECT * FROM services
            WHERE salon_id = $1 AND (is_active OR $2)
            ORDER BY name
            "#,
        )
        .bind(salon_id)
        .bind(include_inactive)
        .fetch_all(pool)
        .await
    }

    pub async fn deactivate(
        pool: &PgPool,
        id: Uuid,
        salon_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, SalonService>(
            r#"
            UPDATE services
            SET is_active = FALSE, updated_at = NOW()
            WHERE id = $1 AND salon_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(salon_id)
        .fetch_optional(pool)
        .await
    }
}
