/// Error taxonomy shared by every service
///
/// Services return [`ServiceResult`]. Nothing here is fatal to the process;
/// each error is scoped to the operation that produced it and the caller
/// decides how to present it.
///
/// Storage errors are classified on the way in:
///
/// | sqlx error | ServiceError |
/// |------------|--------------|
/// | `RowNotFound` | `NotFound` |
/// | SQLSTATE `23P01` (exclusion violation) | `Conflict` |
/// | SQLSTATE `23505` (unique violation) | `Conflict` |
/// | anything else | `Database` |

use crate::capabilities::CapabilityError;
use crate::scheduling::store::SLOT_TAKEN;
use serde::{Deserialize, Serialize};

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// SQLSTATE raised when an exclusion constraint rejects a row
pub const EXCLUSION_VIOLATION: &str = "23P01";

/// SQLSTATE raised when a unique constraint rejects a row
pub const UNIQUE_VIOLATION: &str = "23505";

/// One invalid input field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Field that failed validation
    pub field: String,

    /// Error message
    pub message: String,
}

/// Unified service error
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Referenced entity does not exist
    #[error("Not found: {0}")]
    NotFound(String),

    /// The write collides with existing state (e.g. an occupied time slot)
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Malformed input
    #[error("Validation failed: {} errors", .0.len())]
    Validation(Vec<FieldError>),

    /// Status change not allowed from the current status
    #[error("Invalid {entity} status transition: {from} -> {to}")]
    InvalidTransition {
        entity: &'static str,
        from: String,
        to: String,
    },

    /// An external capability (payments, notifications) failed
    #[error(transparent)]
    Capability(#[from] CapabilityError),

    /// Storage driver error
    #[error("Database error: {0}")]
    Database(#[source] sqlx::Error),

    /// Schema migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl ServiceError {
    /// Single-field validation error
    pub fn validation(field: &str, message: impl Into<String>) -> Self {
        ServiceError::Validation(vec![FieldError {
            field: field.to_string(),
            message: message.into(),
        }])
    }

    pub fn not_found(entity: &str, id: impl std::fmt::Display) -> Self {
        ServiceError::NotFound(format!("{} {} not found", entity, id))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ServiceError::Conflict(_))
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

/// Parsed form of a stored status column
///
/// A value that no longer parses means the row was written by something
/// else; reported as `Conflict`.
pub fn stored_status<T>(raw: &str, parsed: Option<T>, entity: &str) -> ServiceResult<T> {
    parsed.ok_or_else(|| {
        ServiceError::Conflict(format!("{} has unrecognised status '{}'", entity, raw))
    })
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::RowNotFound = err {
            return ServiceError::NotFound("Resource not found".to_string());
        }

        if let sqlx::Error::Database(db_err) = &err {
            match db_err.code().as_deref() {
                Some(EXCLUSION_VIOLATION) => {
                    return ServiceError::Conflict(SLOT_TAKEN.to_string());
                }
                Some(UNIQUE_VIOLATION) => {
                    let constraint = db_err.constraint().unwrap_or("unique");
                    return ServiceError::Conflict(format!("Constraint violation: {}", constraint));
                }
                _ => {}
            }
        }

        ServiceError::Database(err)
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut details: Vec<FieldError> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| FieldError {
                    field: field.to_string(),
                    message: error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Validation failed".to_string()),
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ServiceError::Validation(details)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::Validate;

    #[derive(Validate)]
    struct Named {
        #[validate(length(min = 1, message = "Name is required"))]
        name: String,
    }

    #[test]
    fn test_error_display() {
        let err = ServiceError::NotFound("Staff abc".to_string());
        assert_eq!(err.to_string(), "Not found: Staff abc");

        let err = ServiceError::InvalidTransition {
            entity: "appointment",
            from: "completed".to_string(),
            to: "booked".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid appointment status transition: completed -> booked"
        );
    }

    #[test]
    fn test_row_not_found_maps_to_not_found() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert!(err.is_not_found());
    }

    #[test]
    fn test_other_sqlx_errors_stay_database_errors() {
        let err: ServiceError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, ServiceError::Database(_)));
    }

    #[test]
    fn test_database_error_keeps_its_cause() {
        use std::error::Error as _;

        let err: ServiceError = sqlx::Error::PoolTimedOut.into();
        let cause = err.source().expect("sqlx error as source");
        assert_eq!(cause.to_string(), sqlx::Error::PoolTimedOut.to_string());
    }

    #[test]
    fn test_stored_status_maps_unknown_to_conflict() {
        assert_eq!(stored_status("booked", Some(1), "Appointment").unwrap(), 1);

        let err = stored_status::<u8>("archived", None, "Appointment").unwrap_err();
        assert!(err.is_conflict());
        assert_eq!(
            err.to_string(),
            "Conflict: Appointment has unrecognised status 'archived'"
        );
    }

    #[test]
    fn test_validator_errors_convert() {
        let named = Named {
            name: String::new(),
        };
        let err: ServiceError = named.validate().unwrap_err().into();

        match err {
            ServiceError::Validation(details) => {
                assert_eq!(details.len(), 1);
                assert_eq!(details[0].field, "name");
                assert_eq!(details[0].message, "Name is required");
            }
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_validation_helper() {
        let err = ServiceError::validation("duration_minutes", "must be positive");
        assert_eq!(err.to_string(), "Validation failed: 1 errors");
    }
}
