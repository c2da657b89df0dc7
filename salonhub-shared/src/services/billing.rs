/// Invoicing and payments
///
/// A completed appointment can be invoiced once. Paying an invoice charges
/// the customer through the injected [`PaymentProcessor`] and awards one
/// loyalty point per whole currency unit; refunding reverses both.

use crate::capabilities::{PaymentProcessor, PaymentRequest};
use crate::db::router::{ModelHandle, ModelRouter};
use crate::error::{stored_status, ServiceError, ServiceResult};
use crate::models::appointment::{Appointment, AppointmentStatus};
use crate::models::customer::{points_for_payment, Customer};
use crate::models::invoice::{CreateInvoice, Invoice, InvoiceStatus, InvoiceTotals};
use crate::models::service::{total_price, SalonService};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Reference stored on invoices settled without a charge
pub const NO_CHARGE_REFERENCE: &str = "no_charge";

pub struct BillingService<P> {
    processor: Arc<P>,
    appointments: ModelHandle<Appointment>,
    services: ModelHandle<SalonService>,
    customers: ModelHandle<Customer>,
    invoices: ModelHandle<Invoice>,
    tax_rate_bps: u32,
}

impl<P> Clone for BillingService<P> {
    fn clone(&self) -> Self {
        Self {
            processor: Arc::clone(&self.processor),
            appointments: self.appointments.clone(),
            services: self.services.clone(),
            customers: self.customers.clone(),
            invoices: self.invoices.clone(),
            tax_rate_bps: self.tax_rate_bps,
        }
    }
}

/// Only completed appointments are billable
pub fn ensure_invoiceable(appointment: &Appointment) -> ServiceResult<()> {
    if appointment.get_status() == Some(AppointmentStatus::Completed) {
        Ok(())
    } else {
        Err(ServiceError::validation(
            "appointment_id",
            format!(
                "Only completed appointments can be invoiced (status is {})",
                appointment.status
            ),
        ))
    }
}

fn ensure_invoice_status(
    invoice: &Invoice,
    expected: InvoiceStatus,
    to: InvoiceStatus,
) -> ServiceResult<()> {
    let current = stored_status(&invoice.status, invoice.get_status(), "Invoice")?;
    if current == expected {
        Ok(())
    } else {
        Err(ServiceError::InvalidTransition {
            entity: "invoice",
            from: current.as_str().to_string(),
            to: to.as_str().to_string(),
        })
    }
}

impl<P: PaymentProcessor> BillingService<P> {
    pub fn new(router: &ModelRouter, processor: Arc<P>, tax_rate_bps: u32) -> Self {
        Self {
            processor,
            appointments: router.bind::<Appointment>(),
            services: router.bind::<SalonService>(),
            customers: router.bind::<Customer>(),
            invoices: router.bind::<Invoice>(),
            tax_rate_bps,
        }
    }

    pub fn tax_rate_bps(&self) -> u32 {
        self.tax_rate_bps
    }

    pub async fn create_invoice(
        &self,
        salon_id: Uuid,
        appointment_id: Uuid,
        discount_cents: i64,
    ) -> ServiceResult<Invoice> {
        let appointment =
            Appointment::find_by_id_and_salon(self.appointments.pool(), appointment_id, salon_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Appointment", appointment_id))?;
        ensure_invoiceable(&appointment)?;

        if Invoice::find_by_appointment(self.invoices.pool(), appointment_id)
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(format!(
                "Appointment {} is already invoiced",
                appointment_id
            )));
        }

        let services =
            SalonService::find_many(self.services.pool(), salon_id, &appointment.service_ids)
                .await?;
        let totals =
            InvoiceTotals::compute(total_price(&services), discount_cents, self.tax_rate_bps);

        let invoice = Invoice::create(
            self.invoices.pool(),
            CreateInvoice {
                salon_id,
                appointment_id,
                customer_id: appointment.customer_id,
                totals,
            },
        )
        .await?;

        info!(
            salon_id = %salon_id,
            invoice_id = %invoice.id,
            appointment_id = %appointment_id,
            total_cents = invoice.total_cents,
            "Invoice created"
        );
        Ok(invoice)
    }

    pub async fn get_invoice(&self, salon_id: Uuid, invoice_id: Uuid) -> ServiceResult<Invoice> {
        Invoice::find_by_id_and_salon(self.invoices.pool(), invoice_id, salon_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Invoice", invoice_id))
    }

    pub async fn pay_invoice(&self, salon_id: Uuid, invoice_id: Uuid) -> ServiceResult<Invoice> {
        let invoice = self.get_invoice(salon_id, invoice_id).await?;
        ensure_invoice_status(&invoice, InvoiceStatus::Unpaid, InvoiceStatus::Paid)?;

        let reference = if invoice.total_cents > 0 {
            self.processor
                .charge(&PaymentRequest {
                    salon_id,
                    invoice_id,
                    customer_id: invoice.customer_id,
                    amount_cents: invoice.total_cents,
                    description: format!("Invoice {}", invoice_id),
                })
                .await?
                .reference
        } else {
            NO_CHARGE_REFERENCE.to_string()
        };

        let paid = Invoice::mark_paid(self.invoices.pool(), invoice_id, &reference)
            .await?
            .ok_or_else(|| {
                error!(
                    invoice_id = %invoice_id,
                    reference = %reference,
                    "Invoice changed while being charged"
                );
                ServiceError::Conflict(format!("Invoice {} was modified concurrently", invoice_id))
            })?;

        self.adjust_points(&paid, points_for_payment(paid.total_cents)).await;

        info!(
            salon_id = %salon_id,
            invoice_id = %invoice_id,
            processor = self.processor.name(),
            reference = %reference,
            "Invoice paid"
        );
        Ok(paid)
    }

    pub async fn refund_invoice(&self, salon_id: Uuid, invoice_id: Uuid) -> ServiceResult<Invoice> {
        let invoice = self.get_invoice(salon_id, invoice_id).await?;
        ensure_invoice_status(&invoice, InvoiceStatus::Paid, InvoiceStatus::Refunded)?;

        let reference = invoice
            .payment_reference
            .as_deref()
            .unwrap_or(NO_CHARGE_REFERENCE);
        if invoice.total_cents > 0 && reference != NO_CHARGE_REFERENCE {
            self.processor.refund(reference, invoice.total_cents).await?;
        }

        let refunded = Invoice::mark_refunded(self.invoices.pool(), invoice_id)
            .await?
            .ok_or_else(|| {
                ServiceError::Conflict(format!("Invoice {} was modified concurrently", invoice_id))
            })?;

        self.adjust_points(&refunded, -points_for_payment(refunded.total_cents)).await;

        info!(salon_id = %salon_id, invoice_id = %invoice_id, "Invoice refunded");
        Ok(refunded)
    }

    pub async fn list_invoices(
        &self,
        salon_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> ServiceResult<Vec<Invoice>> {
        Ok(Invoice::list_by_salon(self.invoices.pool(), salon_id, limit, offset).await?)
    }

    /// Loyalty bookkeeping never fails a settled payment
    async fn adjust_points(&self, invoice: &Invoice, delta: i64) {
        if delta == 0 {
            return;
        }

        match Customer::adjust_loyalty_points(self.customers.pool(), invoice.customer_id, delta)
            .await
        {
            Ok(Some(customer)) => info!(
                customer_id = %customer.id,
                delta,
                balance = customer.loyalty_points,
                tier = customer.tier().as_str(),
                "Loyalty points adjusted"
            ),
            Ok(None) => warn!(
                customer_id = %invoice.customer_id,
                "Customer missing, loyalty points not adjusted"
            ),
            Err(e) => warn!(
                customer_id = %invoice.customer_id,
                error = %e,
                "Failed to adjust loyalty points"
            ),
        }
    }
}
