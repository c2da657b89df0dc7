/// Integration tests for booking through the appointment service
///
/// Runs against the in-memory booking store, no database needed.

use chrono::{DateTime, TimeZone, Utc};
use futures::future::join_all;
use salonhub_shared::capabilities::LoggingNotifier;
use salonhub_shared::models::appointment::AppointmentStatus;
use salonhub_shared::scheduling::InMemoryBookingStore;
use salonhub_shared::services::{AppointmentService, BookAppointment};
use std::sync::Arc;
use uuid::Uuid;

type Service = AppointmentService<InMemoryBookingStore, LoggingNotifier>;

struct Salon {
    service: Service,
    salon_id: Uuid,
    staff_id: Uuid,
    customer_id: Uuid,
    cut_id: Uuid,
}

async fn salon() -> Salon {
    let store = Arc::new(InMemoryBookingStore::new());
    let salon_id = Uuid::new_v4();
    let staff = store.add_staff(salon_id, "Mira").await;
    let customer = store
        .add_customer(salon_id, "Noor", Some("noor@example.com"))
        .await;
    let cut = store.add_service(salon_id, "Cut", 30, 2500).await;

    Salon {
        service: AppointmentService::new(store, Arc::new(LoggingNotifier::new())),
        salon_id,
        staff_id: staff.id,
        customer_id: customer.id,
        cut_id: cut.id,
    }
}

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 6, 2, hour, minute, 0).unwrap()
}

fn booking(s: &Salon, start: DateTime<Utc>) -> BookAppointment {
    BookAppointment {
        customer_id: s.customer_id,
        staff_id: s.staff_id,
        service_ids: vec![s.cut_id],
        start_time: start,
        duration_minutes: Some(30),
        notes: None,
    }
}

#[tokio::test]
async fn test_availability_around_a_booking() {
    let s = salon().await;
    s.service.book(s.salon_id, booking(&s, at(10, 0))).await.unwrap();

    for (start, expected) in [(at(10, 0), false), (at(10, 45), true), (at(10, 15), false)] {
        let available = s
            .service
            .is_available(s.staff_id, start, Some(30), None)
            .await
            .unwrap();
        assert_eq!(available, expected, "{}", start);
    }
}

#[tokio::test]
async fn test_concurrent_bookings_for_one_window_admit_exactly_one() {
    let s = salon().await;

    let attempts = (0..16).map(|_| s.service.book(s.salon_id, booking(&s, at(10, 0))));
    let results = join_all(attempts).await;

    let booked = results.iter().filter(|r| r.is_ok()).count();
    let conflicts = results
        .iter()
        .filter(|r| matches!(r, Err(e) if e.is_conflict()))
        .count();

    assert_eq!(booked, 1);
    assert_eq!(conflicts, 15);
    assert_eq!(s.service.store().appointment_count().await, 1);
}

#[tokio::test]
async fn test_concurrent_bookings_across_tasks_admit_exactly_one() {
    let s = Arc::new(salon().await);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let s = Arc::clone(&s);
            // Staggered but overlapping windows: 10:00, 10:05, ... 10:35
            tokio::spawn(async move {
                s.service
                    .book(s.salon_id, booking(&s, at(10, 0) + chrono::Duration::minutes(i * 5)))
                    .await
            })
        })
        .collect();

    let mut booked = Vec::new();
    for handle in handles {
        if let Ok(appointment) = handle.await.unwrap() {
            booked.push(appointment);
        }
    }

    // No two stored bookings may overlap
    for (i, a) in booked.iter().enumerate() {
        for b in &booked[i + 1..] {
            assert!(!a.window().overlaps(&b.window()), "{:?} vs {:?}", a.id, b.id);
        }
    }
    assert!(!booked.is_empty());
}

#[tokio::test]
async fn test_reschedule_moves_the_slot() {
    let s = salon().await;
    let original = s.service.book(s.salon_id, booking(&s, at(10, 0))).await.unwrap();

    let moved = s
        .service
        .reschedule(s.salon_id, original.id, at(13, 0), None)
        .await
        .unwrap();

    assert!(s
        .service
        .is_available(s.staff_id, at(10, 0), Some(30), None)
        .await
        .unwrap());
    assert!(!s
        .service
        .is_available(s.staff_id, at(13, 0), Some(30), None)
        .await
        .unwrap());
    assert_eq!(moved.rescheduled_from, Some(original.id));
}

#[tokio::test]
async fn test_full_lifecycle() {
    let s = salon().await;
    let appointment = s.service.book(s.salon_id, booking(&s, at(9, 0))).await.unwrap();

    for status in [AppointmentStatus::InProgress, AppointmentStatus::Completed] {
        s.service
            .update_status(s.salon_id, appointment.id, status)
            .await
            .unwrap();
    }

    let done = s.service.get(s.salon_id, appointment.id).await.unwrap();
    assert_eq!(done.get_status(), Some(AppointmentStatus::Completed));

    // Completed appointments free the slot
    assert!(s
        .service
        .is_available(s.staff_id, at(9, 0), Some(30), None)
        .await
        .unwrap());

    let err = s
        .service
        .update_status(s.salon_id, appointment.id, AppointmentStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(err.to_string().contains("completed -> cancelled"));
}
