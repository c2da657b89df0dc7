/// Appointment model (tenant partition)
///
/// An appointment books one staff member for one customer over the window
/// `[start_time, end_time)`. Only *active* appointments (`booked`,
/// `in_progress`) occupy their window; the `appointments_no_staff_overlap`
/// exclusion constraint rejects two overlapping active rows for one staff
/// member.
///
/// # State Machine
///
/// ```text
/// booked ──► in_progress ──► completed
///   │             └────────► cancelled
///   ├──► completed
///   ├──► cancelled
///   ├──► no_show
///   └──► rescheduled   (via reschedule only)
/// ```
///
/// `completed`, `cancelled`, `no_show` and `rescheduled` are terminal.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE appointments (
///     id UUID PRIMARY KEY,
///     salon_id UUID NOT NULL,
///     customer_id UUID NOT NULL,
///     staff_id UUID NOT NULL,
///     service_ids UUID[] NOT NULL,
///     start_time TIMESTAMPTZ NOT NULL,
///     end_time TIMESTAMPTZ NOT NULL,
///     duration_minutes INTEGER NOT NULL,
///     status VARCHAR(32) NOT NULL DEFAULT 'booked',
///     rescheduled_from UUID,
///     notes TEXT,
///     created_at TIMESTAMPTZ NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use crate::db::router::{EntityKind, Model};
use crate::scheduling::window::TimeWindow;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres};
use uuid::Uuid;

/// Appointment status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    /// Booked, not started
    Booked,

    /// Customer is in the chair
    InProgress,

    Completed,

    Cancelled,

    /// Customer did not turn up
    NoShow,

    /// Replaced by a newer appointment
    Rescheduled,
}

impl AppointmentStatus {
    pub const ACTIVE: [AppointmentStatus; 2] =
        [AppointmentStatus::Booked, AppointmentStatus::InProgress];

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Booked => "booked",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::Rescheduled => "rescheduled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "booked" => Some(AppointmentStatus::Booked),
            "in_progress" => Some(AppointmentStatus::InProgress),
            "completed" => Some(AppointmentStatus::Completed),
            "cancelled" => Some(AppointmentStatus::Cancelled),
            "no_show" => Some(AppointmentStatus::NoShow),
            "rescheduled" => Some(AppointmentStatus::Rescheduled),
            _ => None,
        }
    }

    /// Whether the appointment occupies its staff member's time
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Booked | AppointmentStatus::InProgress
        )
    }

    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    pub fn can_transition_to(&self, target: AppointmentStatus) -> bool {
        match (self, target) {
            (AppointmentStatus::Booked, AppointmentStatus::InProgress) => true,
            (AppointmentStatus::Booked, AppointmentStatus::Completed) => true,
            (AppointmentStatus::Booked, AppointmentStatus::Cancelled) => true,
            (AppointmentStatus::Booked, AppointmentStatus::NoShow) => true,
            (AppointmentStatus::Booked, AppointmentStatus::Rescheduled) => true,

            (AppointmentStatus::InProgress, AppointmentStatus::Completed) => true,
            (AppointmentStatus::InProgress, AppointmentStatus::Cancelled) => true,

            _ => false,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Appointment
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub salon_id: Uuid,
    pub customer_id: Uuid,
    pub staff_id: Uuid,

    /// Booked services, at least one
    pub service_ids: Vec<Uuid>,

    pub start_time: DateTime<Utc>,

    /// Always `start_time + duration_minutes`
    pub end_time: DateTime<Utc>,

    pub duration_minutes: i32,

    pub status: String,

    /// Appointment this one replaced
    pub rescheduled_from: Option<Uuid>,

    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl Model for Appointment {
    const KIND: EntityKind = EntityKind::Appointment;
    const TABLE: &'static str = "appointments";
}

/// Fully resolved appointment ready to be stored
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub salon_id: Uuid,
    pub customer_id: Uuid,
    pub staff_id: Uuid,
    pub service_ids: Vec<Uuid>,
    pub window: TimeWindow,
    pub rescheduled_from: Option<Uuid>,
    pub notes: Option<String>,
}

impl NewAppointment {
    /// Materializes the row with a fresh id and timestamps
    pub fn into_appointment(self, now: DateTime<Utc>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            salon_id: self.salon_id,
            customer_id: self.customer_id,
            staff_id: self.staff_id,
            service_ids: self.service_ids,
            start_time: self.window.start(),
            end_time: self.window.end(),
            duration_minutes: self.window.duration_minutes(),
            status: AppointmentStatus::Booked.as_str().to_string(),
            rescheduled_from: self.rescheduled_from,
            notes: self.notes,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Appointment {
    pub fn get_status(&self) -> Option<AppointmentStatus> {
        AppointmentStatus::from_str(&self.status)
    }

    pub fn is_active(&self) -> bool {
        self.get_status().map(|s| s.is_active()).unwrap_or(false)
    }

    pub fn window(&self) -> TimeWindow {
        TimeWindow::between(self.start_time, self.end_time)
    }

    /// Inserts a `booked` appointment
    ///
    /// Generic over the executor so it can run inside a transaction.
    pub async fn insert<'e, E>(executor: E, data: &NewAppointment) -> Result<Self, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Appointment>(
            r#"
            INSERT INTO appointments (
                salon_id, customer_id, staff_id, service_ids,
                start_time, end_time, duration_minutes, rescheduled_from, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *
            "#,
        )
        .bind(data.salon_id)
        .bind(data.customer_id)
        .bind(data.staff_id)
        .bind(&data.service_ids)
        .bind(data.window.start())
        .bind(data.window.end())
        .bind(data.window.duration_minutes())
        .bind(data.rescheduled_from)
        .bind(&data.notes)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id_and_salon(
        pool: &PgPool,
        id: Uuid,
        salon_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(
            "SELECT * FROM appointments WHERE id = $1 AND salon_id = $2",
        )
        .bind(id)
        .bind(salon_id)
        .fetch_optional(pool)
        .await
    }

    /// First active appointment of `staff_id` overlapping `window`
    ///
    /// Overlap is symmetric: `start < window.end AND end > window.start`.
    /// Touching windows do not overlap.
    pub async fn find_conflict<'e, E>(
        executor: E,
        staff_id: Uuid,
        window: &TimeWindow,
        exclude: Option<Uuid>,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE staff_id = $1
              AND status IN ('booked', 'in_progress')
              AND start_time < $3
              AND end_time > $2
              AND ($4::uuid IS NULL OR id <> $4)
            ORDER BY start_time
            LIMIT 1
            "#,
        )
        .bind(staff_id)
        .bind(window.start())
        .bind(window.end())
        .bind(exclude)
        .fetch_optional(executor)
        .await
    }

    /// Appointments of a staff member starting in `[from, to)`, any status
    pub async fn list_for_staff(
        pool: &PgPool,
        staff_id: Uuid,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Appointment>(
            r#"
            SELECT * FROM appointments
            WHERE staff_id = $1 AND start_time >= $2 AND start_time < $3
            ORDER BY start_time
            "#,
        )
        .bind(staff_id)
        .bind(from)
        .bind(to)
        .fetch_all(pool)
        .await
    }

    /// Moves an appointment from `from` to `to`
    ///
    /// Returns `None` when the row is no longer in `from`, which callers
    /// treat as a lost race.
    pub async fn update_status<'e, E>(
        executor: E,
        id: Uuid,
        salon_id: Uuid,
        from: AppointmentStatus,
        to: AppointmentStatus,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: sqlx::Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Appointment>(
            r#"
            UPDATE appointments
            SET status = $4, updated_at = NOW()
            WHERE id = $1 AND salon_id = $2 AND status = $3
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(salon_id)
        .bind(from.as_str())
        .bind(to.as_str())
        .fetch_optional(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const ALL: [AppointmentStatus; 6] = [
        AppointmentStatus::Booked,
        AppointmentStatus::InProgress,
        AppointmentStatus::Completed,
        AppointmentStatus::Cancelled,
        AppointmentStatus::NoShow,
        AppointmentStatus::Rescheduled,
    ];

    #[test]
    fn test_status_round_trip() {
        for status in ALL {
            assert_eq!(AppointmentStatus::from_str(status.as_str()), Some(status));
        }
        assert_eq!(AppointmentStatus::from_str("pending"), None);

        // Serialized names match the stored column values
        for status in ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, serde_json::Value::from(status.as_str()));
        }
    }

    #[test]
    fn test_active_statuses() {
        assert!(AppointmentStatus::Booked.is_active());
        assert!(AppointmentStatus::InProgress.is_active());
        assert!(!AppointmentStatus::Cancelled.is_active());
        assert!(!AppointmentStatus::NoShow.is_active());
        assert!(!AppointmentStatus::Completed.is_active());
        assert!(!AppointmentStatus::Rescheduled.is_active());
    }

    #[test]
    fn test_valid_transitions() {
        assert!(AppointmentStatus::Booked.can_transition_to(AppointmentStatus::InProgress));
        assert!(AppointmentStatus::Booked.can_transition_to(AppointmentStatus::NoShow));
        assert!(AppointmentStatus::InProgress.can_transition_to(AppointmentStatus::Completed));
        assert!(AppointmentStatus::InProgress.can_transition_to(AppointmentStatus::Cancelled));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!AppointmentStatus::InProgress.can_transition_to(AppointmentStatus::Booked));
        assert!(!AppointmentStatus::InProgress.can_transition_to(AppointmentStatus::NoShow));
        assert!(!AppointmentStatus::Booked.can_transition_to(AppointmentStatus::Booked));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for status in ALL.into_iter().filter(|s| s.is_terminal()) {
            for target in ALL {
                assert!(!status.can_transition_to(target), "{} -> {}", status, target);
            }
        }
    }

    #[test]
    fn test_into_appointment_derives_end_time() {
        let start = Utc.with_ymd_and_hms(2025, 3, 14, 10, 0, 0).unwrap();
        let new = NewAppointment {
            salon_id: Uuid::new_v4(),
            customer_id: Uuid::new_v4(),
            staff_id: Uuid::new_v4(),
            service_ids: vec![Uuid::new_v4()],
            window: TimeWindow::from_start(start, 45).unwrap(),
            rescheduled_from: None,
            notes: None,
        };

        let appointment = new.into_appointment(start);
        assert_eq!(appointment.end_time, Utc.with_ymd_and_hms(2025, 3, 14, 10, 45, 0).unwrap());
        assert_eq!(appointment.duration_minutes, 45);
        assert_eq!(appointment.get_status(), Some(AppointmentStatus::Booked));
        assert!(appointment.is_active());
    }
}
