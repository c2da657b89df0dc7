/// Appointment scheduling
///
/// - `window`: half-open booking windows and duration limits
/// - `availability`: the conflict checker
/// - `store`: the [`BookingStore`] trait and its PostgreSQL implementation
/// - `memory`: an in-process [`BookingStore`]
///
/// An appointment conflicts with another when both belong to the same staff
/// member, both are active (`booked` or `in_progress`) and their windows
/// overlap.

pub mod availability;
pub mod memory;
pub mod store;
pub mod window;

pub use availability::is_available;
pub use memory::InMemoryBookingStore;
pub use store::{BookingStore, PgBookingStore};
pub use window::{TimeWindow, DEFAULT_DURATION_MINUTES, MAX_DURATION_MINUTES};
