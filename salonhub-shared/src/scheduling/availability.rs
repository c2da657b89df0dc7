/// Appointment conflict checker
///
/// Answers whether a staff member is free for a window. Read-only; the
/// answer may be stale by the time the caller books, which is why the
/// stores re-check under their own lock or constraint.

use crate::error::{ServiceError, ServiceResult};
use crate::scheduling::store::BookingStore;
use crate::scheduling::window::{TimeWindow, DEFAULT_DURATION_MINUTES};
use chrono::{DateTime, Utc};
use tracing::debug;
use uuid::Uuid;

/// Whether `staff_id` has no active appointment overlapping the window
/// starting at `start`
///
/// `duration_minutes` defaults to 60. `exclude` leaves one appointment out
/// of the check, used when moving that appointment.
///
/// # Errors
///
/// - `Validation` if the duration is not within 1-1440 minutes or the
///   window would end past the last representable instant
/// - `NotFound` if the staff member is unknown or inactive
pub async fn is_available<S>(
    store: &S,
    staff_id: Uuid,
    start: DateTime<Utc>,
    duration_minutes: Option<i32>,
    exclude: Option<Uuid>,
) -> ServiceResult<bool>
where
    S: BookingStore + ?Sized,
{
    let window =
        TimeWindow::from_start(start, duration_minutes.unwrap_or(DEFAULT_DURATION_MINUTES))?;

    if store.find_active_staff(staff_id).await?.is_none() {
        return Err(ServiceError::not_found("Staff", staff_id));
    }

    let conflict = store.find_conflict(staff_id, &window, exclude).await?;

    debug!(
        staff_id = %staff_id,
        start = %window.start(),
        end = %window.end(),
        conflicting_id = ?conflict.as_ref().map(|a| a.id),
        "Checked availability"
    );

    Ok(conflict.is_none())
}
