/// Payment processing
///
/// [`crate::services::billing::BillingService`] charges and refunds through
/// a [`PaymentProcessor`]. The only built-in processor records payments
/// taken at the front desk; card gateways plug in behind the same trait.

use crate::capabilities::CapabilityError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

/// A charge to collect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub salon_id: Uuid,
    pub invoice_id: Uuid,
    pub customer_id: Uuid,
    pub amount_cents: i64,
    pub description: String,
}

/// Proof of a completed charge or refund
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentReceipt {
    /// Processor reference, stored on the invoice
    pub reference: String,
    pub amount_cents: i64,
    pub processed_at: DateTime<Utc>,
}

/// Payment capability
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    fn name(&self) -> &str;

    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, CapabilityError>;

    /// Refunds `amount_cents` of the charge identified by `reference`
    async fn refund(
        &self,
        reference: &str,
        amount_cents: i64,
    ) -> Result<PaymentReceipt, CapabilityError>;
}

/// Records cash and card-at-desk payments
#[derive(Debug, Clone, Default)]
pub struct ManualPaymentProcessor;

impl ManualPaymentProcessor {
    pub fn new() -> Self {
        ManualPaymentProcessor
    }
}

#[async_trait]
impl PaymentProcessor for ManualPaymentProcessor {
    fn name(&self) -> &str {
        "manual"
    }

    async fn charge(&self, request: &PaymentRequest) -> Result<PaymentReceipt, CapabilityError> {
        if request.amount_cents <= 0 {
            return Err(CapabilityError::PaymentDeclined(format!(
                "Amount must be positive, got {}",
                request.amount_cents
            )));
        }

        let receipt = PaymentReceipt {
            reference: format!("manual_{}", Uuid::new_v4().simple()),
            amount_cents: request.amount_cents,
            processed_at: Utc::now(),
        };

        info!(
            salon_id = %request.salon_id,
            invoice_id = %request.invoice_id,
            amount_cents = request.amount_cents,
            reference = %receipt.reference,
            "Recorded manual payment"
        );

        Ok(receipt)
    }

    async fn refund(
        &self,
        reference: &str,
        amount_cents: i64,
    ) -> Result<PaymentReceipt, CapabilityError> {
        if amount_cents <= 0 {
            return Err(CapabilityError::PaymentDeclined(format!(
                "Refund amount must be positive, got {}",
                amount_cents
            )));
        }

        let receipt = PaymentReceipt {
            reference: format!("refund_{}", Uuid::new_v4().simple()),
            amount_cents,
            processed_at: Utc::now(),
        };

        info!(
            original_reference = reference,
            amount_cents,
            reference = %receipt.reference,
            "Recorded manual refund"
        );

        Ok(receipt)
    }
}
