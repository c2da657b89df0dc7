/// Service layer
///
/// Each service is a plain struct built once at start-up and shared by
/// reference. Dependencies (storage, notifier, payment processor) are
/// passed in, never looked up globally.
///
/// - `appointment`: booking, rescheduling and status changes
/// - `tenant_admin`: salon registration and super-admin status control
/// - `billing`: invoices, payments and loyalty points

pub mod appointment;
pub mod billing;
pub mod tenant_admin;

pub use appointment::{AppointmentService, BookAppointment};
pub use billing::BillingService;
pub use tenant_admin::{RegisterSalon, RegisteredSalon, TenantAdminService};
