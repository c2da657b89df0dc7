/// In-memory booking store
///
/// Keeps every row in one map set behind a `tokio::sync::Mutex`. Conflict
/// checks and the writes they guard happen under the same lock, which gives
/// the same one-winner guarantee as the exclusion constraint in PostgreSQL.
///
/// Used by tests and by embedders that do not want a database.

use crate::error::{ServiceError, ServiceResult};
use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment};
use crate::models::customer::Customer;
use crate::models::service::SalonService;
use crate::models::staff::Staff;
use crate::scheduling::store::{BookingStore, SLOT_TAKEN};
use crate::scheduling::window::TimeWindow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

#[derive(Debug, Default)]
struct MemoryState {
    staff: HashMap<Uuid, Staff>,
    customers: HashMap<Uuid, Customer>,
    services: HashMap<Uuid, SalonService>,
    appointments: HashMap<Uuid, Appointment>,
}

impl MemoryState {
    fn conflict(
        &self,
        staff_id: Uuid,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> Option<&Appointment> {
        self.appointments
            .values()
            .filter(|a| a.staff_id == staff_id && a.is_active())
            .filter(|a| Some(a.id) != exclude)
            .filter(|a| a.window().overlaps(window))
            .min_by_key(|a| a.start_time)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryBookingStore {
    state: Mutex<MemoryState>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an active staff member
    pub async fn add_staff(&self, salon_id: Uuid, name: &str) -> Staff {
        let now = Utc::now();
        let staff = Staff {
            id: Uuid::new_v4(),
            salon_id,
            name: name.to_string(),
            email: None,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .staff
            .insert(staff.id, staff.clone());
        staff
    }

    /// Returns false if the staff member is unknown
    pub async fn deactivate_staff(&self, staff_id: Uuid) -> bool {
        match self.state.lock().await.staff.get_mut(&staff_id) {
            Some(staff) => {
                staff.is_active = false;
                staff.updated_at = Utc::now();
                true
            }
            None => false,
        }
    }

    pub async fn add_customer(&self, salon_id: Uuid, name: &str, email: Option<&str>) -> Customer {
        let now = Utc::now();
        let customer = Customer {
            id: Uuid::new_v4(),
            salon_id,
            name: name.to_string(),
            email: email.map(str::to_string),
            phone: None,
            loyalty_points: 0,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .customers
            .insert(customer.id, customer.clone());
        customer
    }

    pub async fn add_service(
        &self,
        salon_id: Uuid,
        name: &str,
        duration_minutes: i32,
        price_cents: i64,
    ) -> SalonService {
        let now = Utc::now();
        let service = SalonService {
            id: Uuid::new_v4(),
            salon_id,
            name: name.to_string(),
            duration_minutes,
            price_cents,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        self.state
            .lock()
            .await
            .services
            .insert(service.id, service.clone());
        service
    }

    /// Number of stored appointments, any status
    pub async fn appointment_count(&self) -> usize {
        self.state.lock().await.appointments.len()
    }

    /// Writes a raw status string, bypassing the state machine
    #[cfg(test)]
    pub(crate) async fn overwrite_status(&self, appointment_id: Uuid, raw: &str) {
        if let Some(appointment) = self.state.lock().await.appointments.get_mut(&appointment_id) {
            appointment.status = raw.to_string();
        }
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn find_active_staff(&self, staff_id: Uuid) -> ServiceResult<Option<Staff>> {
        let state = self.state.lock().await;
        Ok(state.staff.get(&staff_id).filter(|s| s.is_active).cloned())
    }

    async fn find_customer(
        &self,
        salon_id: Uuid,
        customer_id: Uuid,
    ) -> ServiceResult<Option<Customer>> {
        let state = self.state.lock().await;
        Ok(state
            .customers
            .get(&customer_id)
            .filter(|c| c.salon_id == salon_id)
            .cloned())
    }

    async fn find_services(
        &self,
        salon_id: Uuid,
        ids: &[Uuid],
    ) -> ServiceResult<Vec<SalonService>> {
        let state = self.state.lock().await;
        Ok(ids
            .iter()
            .filter_map(|id| state.services.get(id))
            .filter(|s| s.salon_id == salon_id)
            .cloned()
            .collect())
    }

    async fn find_conflict(
        &self,
        staff_id: Uuid,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> ServiceResult<Option<Appointment>> {
        let state = self.state.lock().await;
        Ok(state.conflict(staff_id, window, exclude).cloned())
    }

    async fn find_appointment(
        &self,
        salon_id: Uuid,
        appointment_id: Uuid,
    ) -> ServiceResult<Option<Appointment>> {
        let state = self.state.lock().await;
        Ok(state
            .appointments
            .get(&appointment_id)
            .filter(|a| a.salon_id == salon_id)
            .cloned())
    }

    async fn insert_appointment(&self, new: NewAppointment) -> ServiceResult<Appointment> {
        let mut state = self.state.lock().await;

        if state.conflict(new.staff_id, &new.window, None).is_some() {
            return Err(ServiceError::Conflict(SLOT_TAKEN.to_string()));
        }

        let appointment = new.into_appointment(Utc::now());
        state
            .appointments
            .insert(appointment.id, appointment.clone());
        Ok(appointment)
    }

    async fn reschedule(
        &self,
        original: &Appointment,
        replacement: NewAppointment,
    ) -> ServiceResult<Appointment> {
        let mut state = self.state.lock().await;

        let still_booked = state
            .appointments
            .get(&original.id)
            .and_then(|a| a.get_status())
            == Some(AppointmentStatus::Booked);
        if !still_booked {
            return Err(ServiceError::Conflict(format!(
                "Appointment {} was modified concurrently",
                original.id
            )));
        }

        if state
            .conflict(replacement.staff_id, &replacement.window, Some(original.id))
            .is_some()
        {
            return Err(ServiceError::Conflict(SLOT_TAKEN.to_string()));
        }

        let now = Utc::now();
        if let Some(old) = state.appointments.get_mut(&original.id) {
            old.status = AppointmentStatus::Rescheduled.as_str().to_string();
            old.updated_at = now;
        }

        let created = replacement.into_appointment(now);
        state.appointments.insert(created.id, created.clone());
        Ok(created)
    }

    async fn set_status(
        &self,
        appointment: &Appointment,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> ServiceResult<Appointment> {
        let mut state = self.state.lock().await;

        match state.appointments.get_mut(&appointment.id) {
            Some(stored) if stored.get_status() == Some(from) => {
                stored.status = to.as_str().to_string();
                stored.updated_at = Utc::now();
                Ok(stored.clone())
            }
            Some(_) => Err(ServiceError::Conflict(format!(
                "Appointment {} was modified concurrently",
                appointment.id
            ))),
            None => Err(ServiceError::not_found("Appointment", appointment.id)),
        }
    }

    async fn list_for_staff(
        &self,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<Appointment>> {
        let state = self.state.lock().await;
        let mut appointments: Vec<_> = state
            .appointments
            .values()
            .filter(|a| a.staff_id == staff_id && a.start_time >= from && a.start_time < to)
            .cloned()
            .collect();
        appointments.sort_by_key(|a| a.start_time);
        Ok(appointments)
    }
}
