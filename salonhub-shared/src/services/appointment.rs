/// Appointment service
///
/// Books, moves and closes appointments for one salon at a time. Storage
/// goes through a [`BookingStore`] and customer messages through a
/// [`Notifier`], both injected at construction.
///
/// # Booking flow
///
/// ```text
/// book()
///   ├─> validate input
///   ├─> staff active and in this salon?        NotFound otherwise
///   ├─> customer in this salon?                NotFound otherwise
///   ├─> services in catalogue and active?      NotFound / Validation
///   ├─> duration = given or sum of services
///   ├─> window free?                           Conflict otherwise
///   ├─> insert (store re-checks atomically)
///   └─> notify customer (failure only logged)
/// ```

use crate::capabilities::{Channel, Notifier, OutgoingNotification};
use crate::error::{stored_status, ServiceError, ServiceResult};
use crate::models::appointment::{Appointment, AppointmentStatus, NewAppointment};
use crate::models::service::total_duration;
use crate::models::staff::Staff;
use crate::scheduling::availability;
use crate::scheduling::store::{BookingStore, SLOT_TAKEN};
use crate::scheduling::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;
use validator::Validate;

/// Booking request
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BookAppointment {
    pub customer_id: Uuid,

    pub staff_id: Uuid,

    #[validate(length(min = 1, message = "At least one service is required"))]
    pub service_ids: Vec<Uuid>,

    pub start_time: DateTime<Utc>,

    /// Overrides the sum of the services' durations
    pub duration_minutes: Option<i32>,

    #[validate(length(max = 2000, message = "Notes cannot exceed 2000 characters"))]
    pub notes: Option<String>,
}

pub struct AppointmentService<S, N> {
    store: Arc<S>,
    notifier: Arc<N>,
}

impl<S, N> Clone for AppointmentService<S, N> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            notifier: Arc::clone(&self.notifier),
        }
    }
}

fn invalid_transition(from: &str, to: AppointmentStatus) -> ServiceError {
    ServiceError::InvalidTransition {
        entity: "appointment",
        from: from.to_string(),
        to: to.as_str().to_string(),
    }
}

/// Drops repeated ids, keeping first occurrences in order
fn unique_ids(ids: &[Uuid]) -> Vec<Uuid> {
    let mut unique = Vec::with_capacity(ids.len());
    for id in ids {
        if !unique.contains(id) {
            unique.push(*id);
        }
    }
    unique
}

impl<S, N> AppointmentService<S, N>
where
    S: BookingStore,
    N: Notifier,
{
    pub fn new(store: Arc<S>, notifier: Arc<N>) -> Self {
        Self { store, notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// See [`availability::is_available`]
    pub async fn is_available(
        &self,
        staff_id: Uuid,
        start: DateTime<Utc>,
        duration_minutes: Option<i32>,
        exclude: Option<Uuid>,
    ) -> ServiceResult<bool> {
        availability::is_available(self.store.as_ref(), staff_id, start, duration_minutes, exclude)
            .await
    }

    pub async fn book(&self, salon_id: Uuid, request: BookAppointment) -> ServiceResult<Appointment> {
        request.validate()?;

        let staff = self.salon_staff(salon_id, request.staff_id).await?;

        if self
            .store
            .find_customer(salon_id, request.customer_id)
            .await?
            .is_none()
        {
            return Err(ServiceError::not_found("Customer", request.customer_id));
        }

        let service_ids = unique_ids(&request.service_ids);
        let services = self.store.find_services(salon_id, &service_ids).await?;
        if let Some(missing) = service_ids
            .iter()
            .find(|id| !services.iter().any(|s| s.id == **id))
        {
            return Err(ServiceError::not_found("Service", missing));
        }
        if let Some(inactive) = services.iter().find(|s| !s.is_active) {
            return Err(ServiceError::validation(
                "service_ids",
                format!("Service {} is no longer offered", inactive.name),
            ));
        }

        let duration = request
            .duration_minutes
            .unwrap_or_else(|| total_duration(&services));
        let window = TimeWindow::from_start(request.start_time, duration)?;

        if self.store.find_conflict(staff.id, &window, None).await?.is_some() {
            return Err(ServiceError::Conflict(SLOT_TAKEN.to_string()));
        }

        let appointment = self
            .store
            .insert_appointment(NewAppointment {
                salon_id,
                customer_id: request.customer_id,
                staff_id: staff.id,
                service_ids,
                window,
                rescheduled_from: None,
                notes: request.notes,
            })
            .await?;

        info!(
            salon_id = %salon_id,
            appointment_id = %appointment.id,
            staff_id = %appointment.staff_id,
            start = %appointment.start_time,
            duration_minutes = appointment.duration_minutes,
            "Appointment booked"
        );

        self.notify(
            &appointment,
            "Appointment booked",
            format!(
                "Your appointment with {} is booked for {}.",
                staff.name,
                appointment.start_time.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .await;

        Ok(appointment)
    }

    /// Moves a booked appointment to a new start time, optionally to another
    /// staff member
    ///
    /// The original is kept with status `rescheduled`; the returned
    /// appointment is new and points back to it through `rescheduled_from`.
    pub async fn reschedule(
        &self,
        salon_id: Uuid,
        appointment_id: Uuid,
        new_start: DateTime<Utc>,
        new_staff_id: Option<Uuid>,
    ) -> ServiceResult<Appointment> {
        let original = self.get(salon_id, appointment_id).await?;

        let current = stored_status(&original.status, original.get_status(), "Appointment")?;
        if current != AppointmentStatus::Booked {
            return Err(invalid_transition(
                current.as_str(),
                AppointmentStatus::Rescheduled,
            ));
        }

        let staff = self
            .salon_staff(salon_id, new_staff_id.unwrap_or(original.staff_id))
            .await?;
        let window = TimeWindow::from_start(new_start, original.duration_minutes)?;

        if self
            .store
            .find_conflict(staff.id, &window, Some(original.id))
            .await?
            .is_some()
        {
            return Err(ServiceError::Conflict(SLOT_TAKEN.to_string()));
        }

        let replacement = NewAppointment {
            salon_id,
            customer_id: original.customer_id,
            staff_id: staff.id,
            service_ids: original.service_ids.clone(),
            window,
            rescheduled_from: Some(original.id),
            notes: original.notes.clone(),
        };
        let appointment = self.store.reschedule(&original, replacement).await?;

        info!(
            salon_id = %salon_id,
            original_id = %original.id,
            appointment_id = %appointment.id,
            staff_id = %appointment.staff_id,
            start = %appointment.start_time,
            "Appointment rescheduled"
        );

        self.notify(
            &appointment,
            "Appointment rescheduled",
            format!(
                "Your appointment has moved to {} with {}.",
                appointment.start_time.format("%Y-%m-%d %H:%M UTC"),
                staff.name
            ),
        )
        .await;

        Ok(appointment)
    }

    /// Applies a status change allowed by the appointment state machine
    ///
    /// `rescheduled` is refused here; use [`Self::reschedule`].
    pub async fn update_status(
        &self,
        salon_id: Uuid,
        appointment_id: Uuid,
        status: AppointmentStatus,
    ) -> ServiceResult<Appointment> {
        let appointment = self.get(salon_id, appointment_id).await?;

        let current =
            stored_status(&appointment.status, appointment.get_status(), "Appointment")?;

        if status == AppointmentStatus::Rescheduled || !current.can_transition_to(status) {
            return Err(invalid_transition(current.as_str(), status));
        }

        let updated = self.store.set_status(&appointment, current, status).await?;

        info!(
            salon_id = %salon_id,
            appointment_id = %appointment_id,
            from = %current,
            to = %status,
            "Appointment status changed"
        );

        Ok(updated)
    }

    pub async fn cancel(&self, salon_id: Uuid, appointment_id: Uuid) -> ServiceResult<Appointment> {
        let cancelled = self
            .update_status(salon_id, appointment_id, AppointmentStatus::Cancelled)
            .await?;

        self.notify(
            &cancelled,
            "Appointment cancelled",
            format!(
                "Your appointment on {} has been cancelled.",
                cancelled.start_time.format("%Y-%m-%d %H:%M UTC")
            ),
        )
        .await;

        Ok(cancelled)
    }

    pub async fn get(&self, salon_id: Uuid, appointment_id: Uuid) -> ServiceResult<Appointment> {
        self.store
            .find_appointment(salon_id, appointment_id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Appointment", appointment_id))
    }

    /// Appointments of a staff member starting in `[from, to)`, any status
    pub async fn staff_schedule(
        &self,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> ServiceResult<Vec<Appointment>> {
        if to <= from {
            return Err(ServiceError::validation(
                "to",
                "End of range must be after its start",
            ));
        }

        self.store.list_for_staff(staff_id, from, to).await
    }

    async fn salon_staff(&self, salon_id: Uuid, staff_id: Uuid) -> ServiceResult<Staff> {
        self.store
            .find_active_staff(staff_id)
            .await?
            .filter(|staff| staff.salon_id == salon_id)
            .ok_or_else(|| ServiceError::not_found("Staff", staff_id))
    }

    /// Best-effort customer notification
    async fn notify(&self, appointment: &Appointment, subject: &str, body: String) {
        let customer = match self
            .store
            .find_customer(appointment.salon_id, appointment.customer_id)
            .await
        {
            Ok(Some(customer)) => customer,
            Ok(None) => return,
            Err(e) => {
                warn!(appointment_id = %appointment.id, error = %e, "Could not load customer for notification");
                return;
            }
        };

        let Some(recipient) = customer.contact() else {
            debug!(customer_id = %customer.id, "Customer has no contact details, skipping notification");
            return;
        };

        let notification = OutgoingNotification {
            salon_id: appointment.salon_id,
            recipient: recipient.to_string(),
            channel: Channel::for_recipient(recipient),
            subject: subject.to_string(),
            body,
        };

        if let Err(e) = self.notifier.send(&notification).await {
            warn!(
                appointment_id = %appointment.id,
                notifier = self.notifier.name(),
                error = %e,
                "Notification failed"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capabilities::CapabilityError;
    use crate::models::customer::Customer;
    use crate::models::service::SalonService;
    use crate::scheduling::memory::InMemoryBookingStore;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<OutgoingNotification>>,
        fail: bool,
    }

    impl RecordingNotifier {
        fn failing() -> Self {
            Self {
                fail: true,
                ..Default::default()
            }
        }

        fn subjects(&self) -> Vec<String> {
            self.sent
                .lock()
                .unwrap()
                .iter()
                .map(|n| n.subject.clone())
                .collect()
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        fn name(&self) -> &str {
            "recording"
        }

        async fn send(&self, notification: &OutgoingNotification) -> Result<(), CapabilityError> {
            if self.fail {
                return Err(CapabilityError::Delivery("smtp down".to_string()));
            }
            self.sent.lock().unwrap().push(notification.clone());
            Ok(())
        }
    }

    struct Fixture {
        service: AppointmentService<InMemoryBookingStore, RecordingNotifier>,
        notifier: Arc<RecordingNotifier>,
        salon_id: Uuid,
        staff: Staff,
        customer: Customer,
        cut: SalonService,
    }

    async fn fixture_with(notifier: RecordingNotifier) -> Fixture {
        let store = Arc::new(InMemoryBookingStore::new());
        let notifier = Arc::new(notifier);
        let salon_id = Uuid::new_v4();
        let staff = store.add_staff(salon_id, "Mira").await;
        let customer = store
            .add_customer(salon_id, "Noor", Some("noor@example.com"))
            .await;
        let cut = store.add_service(salon_id, "Cut", 30, 2500).await;

        Fixture {
            service: AppointmentService::new(store, Arc::clone(&notifier)),
            notifier,
            salon_id,
            staff,
            customer,
            cut,
        }
    }

    async fn fixture() -> Fixture {
        fixture_with(RecordingNotifier::default()).await
    }

    fn at(hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 14, hour, minute, 0).unwrap()
    }

    fn request(f: &Fixture, start: DateTime<Utc>) -> BookAppointment {
        BookAppointment {
            customer_id: f.customer.id,
            staff_id: f.staff.id,
            service_ids: vec![f.cut.id],
            start_time: start,
            duration_minutes: None,
            notes: None,
        }
    }

    #[tokio::test]
    async fn test_book_derives_duration_from_services() {
        let f = fixture().await;
        let colour = f
            .service
            .store()
            .add_service(f.salon_id, "Colour", 45, 6000)
            .await;

        let mut req = request(&f, at(10, 0));
        req.service_ids.push(colour.id);
        let appointment = f.service.book(f.salon_id, req).await.unwrap();

        assert_eq!(appointment.duration_minutes, 75);
        assert_eq!(appointment.end_time, at(11, 15));
        assert_eq!(appointment.get_status(), Some(AppointmentStatus::Booked));
        assert_eq!(f.notifier.subjects(), vec!["Appointment booked"]);
    }

    #[tokio::test]
    async fn test_book_rejects_taken_slot() {
        let f = fixture().await;
        f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        let err = f
            .service
            .book(f.salon_id, request(&f, at(10, 15)))
            .await
            .unwrap_err();

        assert!(err.is_conflict());
    }

    #[tokio::test]
    async fn test_book_rejects_unknown_service() {
        let f = fixture().await;
        let mut req = request(&f, at(10, 0));
        req.service_ids = vec![Uuid::new_v4()];

        let err = f.service.book(f.salon_id, req).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_book_rejects_staff_of_other_salon() {
        let f = fixture().await;
        let outsider = f.service.store().add_staff(Uuid::new_v4(), "Elsewhere").await;
        let mut req = request(&f, at(10, 0));
        req.staff_id = outsider.id;

        let err = f.service.book(f.salon_id, req).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_book_requires_services() {
        let f = fixture().await;
        let mut req = request(&f, at(10, 0));
        req.service_ids.clear();

        let err = f.service.book(f.salon_id, req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_book_rejects_explicit_zero_duration() {
        let f = fixture().await;
        let mut req = request(&f, at(10, 0));
        req.duration_minutes = Some(0);

        let err = f.service.book(f.salon_id, req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
    }

    #[tokio::test]
    async fn test_reschedule_frees_old_slot() {
        let f = fixture().await;
        let original = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        let moved = f
            .service
            .reschedule(f.salon_id, original.id, at(14, 0), None)
            .await
            .unwrap();

        assert_eq!(moved.rescheduled_from, Some(original.id));
        assert_eq!(moved.duration_minutes, 30);
        assert!(f
            .service
            .is_available(f.staff.id, at(10, 0), Some(30), None)
            .await
            .unwrap());
        assert!(!f
            .service
            .is_available(f.staff.id, at(14, 0), Some(30), None)
            .await
            .unwrap());

        let old = f.service.get(f.salon_id, original.id).await.unwrap();
        assert_eq!(old.get_status(), Some(AppointmentStatus::Rescheduled));
    }

    #[tokio::test]
    async fn test_reschedule_into_overlapping_own_window() {
        let f = fixture().await;
        let original = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        let moved = f
            .service
            .reschedule(f.salon_id, original.id, at(10, 15), None)
            .await
            .unwrap();

        assert_eq!(moved.start_time, at(10, 15));
    }

    #[tokio::test]
    async fn test_reschedule_onto_taken_slot_conflicts() {
        let f = fixture().await;
        let first = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();
        f.service.book(f.salon_id, request(&f, at(11, 0))).await.unwrap();

        let err = f
            .service
            .reschedule(f.salon_id, first.id, at(11, 0), None)
            .await
            .unwrap_err();

        assert!(err.is_conflict());
        let unchanged = f.service.get(f.salon_id, first.id).await.unwrap();
        assert_eq!(unchanged.get_status(), Some(AppointmentStatus::Booked));
    }

    #[tokio::test]
    async fn test_reschedule_to_other_staff() {
        let f = fixture().await;
        let colleague = f.service.store().add_staff(f.salon_id, "Jun").await;
        let original = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        let moved = f
            .service
            .reschedule(f.salon_id, original.id, at(10, 0), Some(colleague.id))
            .await
            .unwrap();

        assert_eq!(moved.staff_id, colleague.id);
    }

    #[tokio::test]
    async fn test_only_booked_appointments_can_be_rescheduled() {
        let f = fixture().await;
        let appointment = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();
        f.service.cancel(f.salon_id, appointment.id).await.unwrap();

        let err = f
            .service
            .reschedule(f.salon_id, appointment.id, at(12, 0), None)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_update_status_follows_state_machine() {
        let f = fixture().await;
        let appointment = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        let started = f
            .service
            .update_status(f.salon_id, appointment.id, AppointmentStatus::InProgress)
            .await
            .unwrap();
        assert_eq!(started.get_status(), Some(AppointmentStatus::InProgress));

        let err = f
            .service
            .update_status(f.salon_id, appointment.id, AppointmentStatus::NoShow)
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidTransition { .. }));

        f.service
            .update_status(f.salon_id, appointment.id, AppointmentStatus::Completed)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_update_status_refuses_rescheduled() {
        let f = fixture().await;
        let appointment = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        let err = f
            .service
            .update_status(f.salon_id, appointment.id, AppointmentStatus::Rescheduled)
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn test_unrecognised_stored_status_is_conflict() {
        let f = fixture().await;
        let appointment = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();
        f.service
            .store()
            .overwrite_status(appointment.id, "pending_review")
            .await;

        let err = f
            .service
            .update_status(f.salon_id, appointment.id, AppointmentStatus::Completed)
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "{:?}", err);

        let err = f
            .service
            .reschedule(f.salon_id, appointment.id, at(12, 0), None)
            .await
            .unwrap_err();
        assert!(err.is_conflict(), "{:?}", err);
    }

    #[tokio::test]
    async fn test_book_at_calendar_limit_is_validation_error() {
        let f = fixture().await;
        let req = request(&f, DateTime::<Utc>::MAX_UTC);

        let err = f.service.book(f.salon_id, req).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));
        assert_eq!(f.service.store().appointment_count().await, 0);
    }

    #[tokio::test]
    async fn test_cancel_frees_slot_and_notifies() {
        let f = fixture().await;
        let appointment = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        f.service.cancel(f.salon_id, appointment.id).await.unwrap();

        assert!(f
            .service
            .is_available(f.staff.id, at(10, 0), Some(30), None)
            .await
            .unwrap());
        assert_eq!(
            f.notifier.subjects(),
            vec!["Appointment booked", "Appointment cancelled"]
        );
    }

    #[tokio::test]
    async fn test_notification_failure_does_not_fail_booking() {
        let f = fixture_with(RecordingNotifier::failing()).await;

        let appointment = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        assert_eq!(
            f.service.get(f.salon_id, appointment.id).await.unwrap().id,
            appointment.id
        );
    }

    #[tokio::test]
    async fn test_get_is_scoped_to_salon() {
        let f = fixture().await;
        let appointment = f.service.book(f.salon_id, request(&f, at(10, 0))).await.unwrap();

        let err = f.service.get(Uuid::new_v4(), appointment.id).await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_staff_schedule_is_ordered() {
        let f = fixture().await;
        f.service.book(f.salon_id, request(&f, at(15, 0))).await.unwrap();
        f.service.book(f.salon_id, request(&f, at(9, 0))).await.unwrap();

        let schedule = f
            .service
            .staff_schedule(f.staff.id, at(0, 0), at(23, 0))
            .await
            .unwrap();

        let starts: Vec<_> = schedule.iter().map(|a| a.start_time).collect();
        assert_eq!(starts, vec![at(9, 0), at(15, 0)]);

        assert!(f
            .service
            .staff_schedule(f.staff.id, at(12, 0), at(12, 0))
            .await
            .is_err());
    }

    #[test]
    fn test_unique_ids_keeps_order() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        assert_eq!(unique_ids(&[a, b, a]), vec![a, b]);
    }
}
