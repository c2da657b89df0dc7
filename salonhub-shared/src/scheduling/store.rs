/// Booking storage
///
/// [`BookingStore`] is everything the appointment service needs from
/// storage. Two implementations exist:
///
/// - [`PgBookingStore`]: the tenant partition, reached through the model
///   router. Overlapping active bookings are rejected by the
///   `appointments_no_staff_overlap` exclusion constraint, so two racing
///   inserts cannot both succeed.
/// - [`crate::scheduling::memory::InMemoryBookingStore`]: a process-local
///   store that does its check-and-insert under one lock.
///
/// Implementations must make `insert_appointment` and `reschedule` atomic
/// with respect to the conflict check: when they succeed, no other active
/// appointment of the same staff member overlaps the stored window.

use crate::db::router::{ModelHandle, ModelRouter};
use crate::error::{ServiceError, ServiceResult};
use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment};
use crate::models::customer::Customer;
use crate::models::service::SalonService;
use crate::models::staff::Staff;
use crate::scheduling::window::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Message used whenever a window is already taken
pub const SLOT_TAKEN: &str = "Staff member already has an active booking in this time window";

#[async_trait]
pub trait BookingStore: Send + Sync {
    /// Staff member by id, only if active
    async fn find_active_staff(&self, staff_id: Uuid) -> ServiceResult<Option<Staff>>;

    async fn find_customer(&self, salon_id: Uuid, customer_id: Uuid)
        -> ServiceResult<Option<Customer>>;

    /// Services of `salon_id` among `ids`; missing ids are left out
    async fn find_services(&self, salon_id: Uuid, ids: &[Uuid])
        -> ServiceResult<Vec<SalonService>>;

    /// First active appointment of the staff member overlapping `window`
    async fn find_conflict(
        &self,
        staff_id: Uuid,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> ServiceResult<Option<Appointment>>;

    async fn find_appointment(
        &self,
        salon_id: Uuid,
        appointment_id: Uuid,
    ) -> ServiceResult<Option<Appointment>>;

    /// Stores a `booked` appointment, or fails with `Conflict`
    async fn insert_appointment(&self, new: NewAppointment) -> ServiceResult<Appointment>;

    /// Marks `original` rescheduled and stores `replacement` in one step
    ///
    /// Either both changes land or neither does.
    async fn reschedule(
        &self,
        original: &Appointment,
        replacement: NewAppointment,
    ) -> ServiceResult<Appointment>;

    /// Moves an appointment from `from` to `to`
    ///
    /// Fails with `Conflict` if the stored status is no longer `from`.
    async fn set_status(
        &self,
        appointment: &Appointment,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> ServiceResult<Appointment>;

    /// Appointments of a staff member starting in `[from, to)`
    async fn list_for_staff(
        &self,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<Appointment>>;
}

/// PostgreSQL booking store
#[derive(Debug, Clone)]
pub struct PgBookingStore {
    staff: ModelHandle<Staff>,
    customers: ModelHandle<Customer>,
    services: ModelHandle<SalonService>,
    appointments: ModelHandle<Appointment>,
}

impl PgBookingStore {
    pub fn new(router: &ModelRouter) -> Self {
        Self {
            staff: router.bind::<Staff>(),
            customers: router.bind::<Customer>(),
            services: router.bind::<SalonService>(),
            appointments: router.bind::<Appointment>(),
        }
    }
}

fn status_changed(appointment: &Appointment) -> ServiceError {
    ServiceError::Conflict(format!(
        "Appointment {} was modified concurrently",
        appointment.id
    ))
}

#[async_trait]
impl BookingStore for PgBookingStore {
    async fn find_active_staff(&self, staff_id: Uuid) -> ServiceResult<Option<Staff>> {
        Ok(Staff::find_active(self.staff.pool(), staff_id).await?)
    }

    async fn find_customer(
        &self,
        salon_id: Uuid,
        customer_id: Uuid,
    ) -> ServiceResult<Option<Customer>> {
        Ok(Customer::find_by_id_and_salon(self.customers.pool(), customer_id, salon_id).await?)
    }

    async fn find_services(
        &self,
        salon_id: Uuid,
        ids: &[Uuid],
    ) -> ServiceResult<Vec<SalonService>> {
        Ok(SalonService::find_many(self.services.pool(), salon_id, ids).await?)
    }

    async fn find_conflict(
        &self,
        staff_id: Uuid,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> ServiceResult<Option<Appointment>> {
        Ok(Appointment::find_conflict(self.appointments.pool(), staff_id, window, exclude).await?)
    }

    async fn find_appointment(
        &self,
        salon_id: Uuid,
        appointment_id: Uuid,
    ) -> ServiceResult<Option<Appointment>> {
        Ok(
            Appointment::find_by_id_and_salon(self.appointments.pool(), appointment_id, salon_id)
                .await?,
        )
    }

    async fn insert_appointment(&self, new: NewAppointment) -> ServiceResult<Appointment> {
        // Fast path for a readable error; the exclusion constraint closes the race.
        if let Some(existing) = self.find_conflict(new.staff_id, &new.window, None).await? {
            debug!(conflicting_id = %existing.id, "Booking rejected by pre-check");
            return Err(ServiceError::Conflict(SLOT_TAKEN.to_string()));
        }

        Ok(Appointment::insert(self.appointments.pool(), &new).await?)
    }

    async fn reschedule(
        &self,
        original: &Appointment,
        replacement: NewAppointment,
    ) -> ServiceResult<Appointment> {
        let mut tx = self.appointments.pool().begin().await?;

        let retired = Appointment::update_status(
            &mut *tx,
            original.id,
            original.salon_id,
            AppointmentStatus::Booked,
            AppointmentStatus::Rescheduled,
        )
        .await?;
        if retired.is_none() {
            return Err(status_changed(original));
        }

        let conflict = Appointment::find_conflict(
            &mut *tx,
            replacement.staff_id,
            &replacement.window,
            Some(original.id),
        )
        .await?;
        if conflict.is_some() {
            return Err(ServiceError::Conflict(SLOT_TAKEN.to_string()));
        }

        let created = Appointment::insert(&mut *tx, &replacement).await?;
        tx.commit().await?;

        Ok(created)
    }

    async fn set_status(
        &self,
        appointment: &Appointment,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> ServiceResult<Appointment> {
        Appointment::update_status(
            self.appointments.pool(),
            appointment.id,
            appointment.salon_id,
            from,
            to,
        )
        .await?
        .ok_or_else(|| status_changed(appointment))
    }

    async fn list_for_staff(
        &self,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<Appointment>> {
        Ok(Appointment::list_for_staff(self.appointments.pool(), staff_id, from, to).await?)
    }
}
