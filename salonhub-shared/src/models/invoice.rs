/// Invoices (tenant partition)
///
/// One invoice per completed appointment. Amounts are integer cents.
///
/// ```text
/// taxable = subtotal - min(discount, subtotal)
/// tax     = round_half_up(taxable * tax_rate_bps / 10_000)
/// total   = taxable + tax
/// ```
///
/// Status goes `unpaid → paid → refunded`; nothing else.

use crate::db::router::{EntityKind, Model};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Unpaid,
    Paid,
    Refunded,
}

impl InvoiceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Unpaid => "unpaid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Refunded => "refunded",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "unpaid" => Some(InvoiceStatus::Unpaid),
            "paid" => Some(InvoiceStatus::Paid),
            "refunded" => Some(InvoiceStatus::Refunded),
            _ => None,
        }
    }
}

/// Computed invoice amounts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTotals {
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
}

impl InvoiceTotals {
    /// Applies discount then tax. Negative inputs count as zero.
    pub fn compute(subtotal_cents: i64, discount_cents: i64, tax_rate_bps: u32) -> Self {
        let subtotal_cents = subtotal_cents.max(0);
        let discount_cents = discount_cents.clamp(0, subtotal_cents);
        let taxable = subtotal_cents - discount_cents;
        let tax_cents = (taxable * i64::from(tax_rate_bps) + 5_000) / 10_000;

        Self {
            subtotal_cents,
            discount_cents,
            tax_cents,
            total_cents: taxable + tax_cents,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub appointment_id: Uuid,
    pub customer_id: Uuid,
    pub subtotal_cents: i64,
    pub discount_cents: i64,
    pub tax_cents: i64,
    pub total_cents: i64,
    pub status: String,

    /// Processor reference of the charge, once paid
    pub payment_reference: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Model for Invoice {
    const KIND: EntityKind = EntityKind::Invoice;
    const TABLE: &'static str = "invoices";
}

#[derive(Debug, Clone)]
pub struct CreateInvoice {
    pub salon_id: Uuid,
    pub appointment_id: Uuid,
    pub customer_id: Uuid,
    pub totals: InvoiceTotals,
}

impl Invoice {
    pub fn get_status(&self) -> Option<InvoiceStatus> {
        InvoiceStatus::from_str(&self.status)
    }

    /// Inserts an unpaid invoice
    ///
    /// A second invoice for the same appointment violates
    /// `invoices_appointment_unique`.
    pub async fn create(pool: &PgPool, data: CreateInvoice) -> Result<Self, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                salon_id, appointment_id, customer_id,
                subtotal_cents, discount_cents, tax_cents, total_cents
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(data.salon_id)
        .bind(data.appointment_id)
        .bind(data.customer_id)
        .bind(data.totals.subtotal_cents)
        .bind(data.totals.discount_cents)
        .bind(data.totals.tax_cents)
        .bind(data.totals.total_cents)
        .fetch_one(pool)
        .await
    }

    pub async fn find_by_id_and_salon(
        pool: &PgPool,
        id: Uuid,
        salon_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE id = $1 AND salon_id = $2")
            .bind(id)
            .bind(salon_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_appointment(
        pool: &PgPool,
        appointment_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>("SELECT * FROM invoices WHERE appointment_id = $1")
            .bind(appointment_id)
            .fetch_optional(pool)
            .await
    }

    /// Marks an unpaid invoice paid; `None` if it was not unpaid
    pub async fn mark_paid(
        pool: &PgPool,
        id: Uuid,
        payment_reference: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = 'paid', payment_reference = $2, updated_at = NOW()
            WHERE id = $1 AND status = 'unpaid'
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payment_reference)
        .fetch_optional(pool)
        .await
    }

    /// Marks a paid invoice refunded; `None` if it was not paid
    pub async fn mark_refunded(pool: &PgPool, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = 'refunded', updated_at = NOW()
            WHERE id = $1 AND status = 'paid'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    pub async fn list_by_salon(
        pool: &PgPool,
        salon_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            SELECT * FROM invoices
            WHERE salon_id = $1
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(salon_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
    }
}
