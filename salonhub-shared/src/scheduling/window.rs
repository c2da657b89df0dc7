/// Half-open booking windows
///
/// A window covers `[start, end)`. Two windows overlap when each starts
/// before the other ends, so back-to-back bookings (10:00-10:30 then
/// 10:30-11:00) do not collide.

use crate::error::{ServiceError, ServiceResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Default appointment length when none is given
pub const DEFAULT_DURATION_MINUTES: i32 = 60;

/// Longest bookable appointment (24 hours)
pub const MAX_DURATION_MINUTES: i32 = 1440;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `duration_minutes` starting at `start`
    ///
    /// Fails with a validation error unless `1 <= duration_minutes <= 1440`
    /// and the end is a representable instant.
    pub fn from_start(start: DateTime<Utc>, duration_minutes: i32) -> ServiceResult<Self> {
        validate_duration(duration_minutes)?;

        let end = start
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
            .ok_or_else(|| {
                ServiceError::validation("start_time", "Start time is too far in the future")
            })?;

        Ok(Self { start, end })
    }

    /// Window between two stored instants, taken as-is
    pub fn between(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    pub fn duration_minutes(&self) -> i32 {
        (self.end - self.start).num_minutes() as i32
    }

    /// Symmetric interval overlap
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// Checks a requested duration
pub fn validate_duration(duration_minutes: i32) -> ServiceResult<()> {
    if duration_minutes <= 0 {
        return Err(ServiceError::validation(
            "duration_minutes",
            "Duration must be positive",
        ));
    }
    if duration_minutes > MAX_DURATION_MINUTES {
        return Err(ServiceError::validation(
            "duration_minutes",
            format!("Duration cannot exceed {} minutes", MAX_DURATION_MINUTES),
        ));
    }
    Ok(())
}
