/// Customers and loyalty tiers (tenant partition)
///
/// Customers earn one loyalty point per whole currency unit paid. The tier
/// is derived from the running balance:
///
/// | Tier     | Points       |
/// |----------|--------------|
/// | Bronze   | 0 - 499      |
/// | Silver   | 500 - 1499   |
/// | Gold     | 1500 - 4999  |
/// | Platinum | 5000+        |

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Loyalty tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoyaltyTier {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

impl LoyaltyTier {
    pub fn from_points(points: i64) -> Self {
        match points {
            p if p >= 5000 => LoyaltyTier::Platinum,
            p if p >= 1500 => LoyaltyTier::Gold,
            p if p >= 500 => LoyaltyTier::Silver,
            _ => LoyaltyTier::Bronze,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            LoyaltyTier::Bronze => "bronze",
            LoyaltyTier::Silver => "silver",
            LoyaltyTier::Gold => "gold",
            LoyaltyTier::Platinum => "platinum",
        }
    }
}

/// Points earned for a payment of `amount_cents`
pub fn points_for_payment(amount_cents: i64) -> i64 {
    (amount_cents / 100).max(0)
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Customer {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub loyalty_points: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for Customer {
    const KIND: EntityKind = EntityKind::Customer;
    const TABLE: &'static str = "customers";
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCustomer {
    pub salon_id: Uuid,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(min = 5, max = 32, message = "Phone must be 5-32 characters"))]
    pub phone: Option<String>,
}

impl Customer {
    pub fn tier(&self) -> LoyaltyTier {
        LoyaltyTier::from_points(self.loyalty_points)
    }

    /// Where notifications for this customer go, if anywhere
    pub fn contact(&self) -> Option<&str> {
        self.email.as_deref().or(self.phone.as_deref())
    }

    pub async fn create(pool: &PgPool, data: CreateCustomer) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"
            INSERT INTO customers (salon_id, name, email, phone)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(data.salon_id)
        .bind(data.name)
        .bind(data.email)
        .bind(data.phone)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id_and_salon(
        pool: &PgPool,
        id: Uuid,
        salon_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>("SELECT * FROM customers WHERE id = $1 AND salon_id = $2")
            .bind(id)
            .bind(salon_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list_by_salon(
        pool: &PgPool,
        salon_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"
            SELECT * FROM customers
            WHERE salon_id = $1
            ORDER BY name
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(salon_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    /// Adds `delta` points (negative to withdraw), never going below zero
    pub async fn adjust_loyalty_points(
        pool: &PgPool,
        id: Uuid,
        delta: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Customer>(
            r#"
            UPDATE customers
            SET loyalty_points = GREATEST(0, loyalty_points + $2), updated_at = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(pool)
        .await
    }
}
