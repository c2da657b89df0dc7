/// Staff members (tenant partition)
///
/// Staff belong to exactly one salon. Deactivated staff keep their history
/// but can no longer be booked.

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Staff {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for Staff {
    const KIND: EntityKind = EntityKind::Staff;
    const TABLE: &'static str = "staff";
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateStaff {
    pub salon_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,
}

impl Staff {
    pub async fn create(pool: &PgPool, data: CreateStaff) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Staff>(
            r#"
            INSERT INTO staff (salon_id, name, email)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(data.salon_id)
        .bind(data.name)
        .bind(data.email)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id_and_salon(
        pool: &PgPool,
        id: Uuid,
        salon_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1 AND salon_id = $2")
            .bind(id)
            .bind(salon_id)
            .fetch_optional(pool)
            .await
    }

    /// Finds a staff member who can currently take bookings
    pub async fn find_active(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Staff>("SELECT * FROM staff WHERE id = $1 AND is_active")
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_salon(
        pool: &PgPool,
        salon_id: Uuid,
        include_inactive: bool,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(
            r#"
            SELECT * FROM staff
            WHERE salon_id = $1 AND (is_active OR $2)
            ORDER BY name
            "#,
        )
        .bind(salon_id)
        .bind(include_inactive)
        .fetch_all(pool)
        .await
    }

    /// Stops a staff member from taking new bookings
    ///
    /// Existing appointments are left untouched.
    pub async fn deactivate(
        pool: &PgPool,
        id: Uuid,
        salon_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Staff>(
            r#"
            UPDATE staff
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
