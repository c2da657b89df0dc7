/// Platform user accounts
///
/// Users live in the platform partition. A user is either a super-admin
/// operating the platform or the owner of one or more salons. Credentials
/// and sessions are handled by the identity provider, not here.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email VARCHAR(255) NOT NULL UNIQUE,
///     name VARCHAR(255) NOT NULL,
///     role VARCHAR(32) NOT NULL DEFAULT 'salon_owner',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

/// Platform role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Operates the platform (approves salons, manages subscriptions)
    SuperAdmin,

    /// Owns a salon
    SalonOwner,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::SuperAdmin => "super_admin",
            UserRole::SalonOwner => "salon_owner",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "super_admin" => Some(UserRole::SuperAdmin),
            "salon_owner" => Some(UserRole::SalonOwner),
            _ => None,
        }
    }
}

/// Platform user
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: Uuid,

    /// Login email, stored lowercase
    pub email: String,

    pub name: String,

    pub role: String,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Model for User {
    const KIND: EntityKind = EntityKind::User;
    const TABLE: &'static str = "users";
}

/// Input for creating a user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(min = 1, max = 255, message = "Name must be 1-255 characters"))]
    pub name: String,

    pub role: UserRole,
}

impl User {
    pub fn get_role(&self) -> Option<UserRole> {
        UserRole::from_str(&self.role)
    }

    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Fails with a unique violation if the email is taken.
    pub async fn create(pool: &PgPool, data: CreateUser) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, role)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(normalize_email(&data.email))
        .bind(data.name)
        .bind(data.role.as_str())
        .fetch_one(pool)
        .await
    }

    /// Returns the user with this email, creating it if absent
    ///
    /// The boolean is `true` when a new row was inserted.
    pub async fn find_or_create(pool: &PgPool, data: CreateUser) -> Result<(Self, bool), sqlx::Error> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (email) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(normalize_email(&data.email))
        .bind(&data.name)
        .bind(data.role.as_str())
        .fetch_optional(pool)
        .await?;

        match inserted {
            Some(user) => Ok((user, true)),
            None => {
                let user = Self::find_by_email(pool, &data.email)
                    .await?
                    .ok_or(sqlx::Error::RowNotFound)?;
                Ok((user, false))
            }
        }
    }

    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(normalize_email(email))
            .fetch_optional(pool)
            .await
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
