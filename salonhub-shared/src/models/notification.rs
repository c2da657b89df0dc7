/// In-app notifications (platform partition)
///
/// Rows are written by [`crate::capabilities::OutboxNotifier`] and read by
/// whatever front-end shows a salon's inbox.

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Stored notification
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub recipient: String,
    pub channel: String,
    pub subject: String,
    pub body: String,
    pub read_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Model for Notification {
    const KIND: EntityKind = EntityKind::Notification;
    const TABLE: &'static str = "notifications";
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateNotification {
    pub salon_id: Uuid,
    pub recipient: String,
    pub channel: String,
    pub subject: String,
    pub body: String,
}

impl Notification {
    pub fn is_read(&self) -> bool {
        self.read_at.is_some()
    }

    pub async fn create(pool: &PgPool, data: CreateNotification) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (salon_id, recipient, channel, subject, body)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(data.salon_id)
        .bind(data.recipient)
        .bind(data.channel)
        .bind(data.subject)
        .bind(data.body)
        .fetch_one(pool)
        .await
    }

    /// Newest first
    pub async fn list_for_recipient(
        pool: &PgPool,
        recipient: &str,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT * FROM notifications
            WHERE recipient = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(recipient)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }

    pub async fn count_unread(pool: &PgPool, recipient: &str) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE recipient = $1 AND read_at IS NULL",
        )
        .bind(recipient)
        .fetch_one(pool)
        .await
    }

    /// Marks a notification read; returns false if it was unknown or already read
    pub async fn mark_read(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE notifications SET read_at = NOW() WHERE id = $1 AND read_at IS NULL",
        )
        .bind(id)
        .execute(pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
