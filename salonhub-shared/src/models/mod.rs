/// Database models for SalonHub
///
/// Each model is a row struct plus its queries. Every model implements
/// [`crate::db::router::Model`], which fixes the partition it lives in.
///
/// # Models
///
/// Platform partition:
///
/// - `user`: Platform accounts (super-admins and salon owners)
/// - `subscription`: One subscription per salon
/// - `notification`: Stored in-app notifications
///
/// Tenant partition:
///
/// - `salon`: Salons, the unit of tenant isolation
/// - `staff`: Bookable staff members
/// - `customer`: Customers and loyalty tiers
/// - `service`: Service catalogue
/// - `appointment`: Bookings and their lifecycle
/// - `invoice`: Invoices for completed appointments
///
/// # Example
///
/// ```no_run
/// use salonhub_shared::models::staff::{CreateStaff, Staff};
/// use sqlx::PgPool;
/// use uuid::Uuid;
///
/// # async fn example(tenant: PgPool, salon_id: Uuid) -> Result<(), sqlx::Error> {
/// let staff = Staff::create(
///     &tenant,
///     CreateStaff {
///         salon_id,
///         name: "Mira".to_string(),
///         email: None,
///     },
/// )
/// .await?;
/// # Ok(())
/// # }
/// ```

pub mod appointment;
pub mod customer;
pub mod invoice;
pub mod notification;
pub mod salon;
pub mod service;
pub mod staff;
pub mod subscription;
pub mod user;
