//! Domain error types.

use thiserror::Error;

use crate::models::ZoneId;

/// Failure reported by a [`ZoneStore`](crate::services::store::ZoneStore)
/// implementation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The backing store could not be reached or rejected the request.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A stored record did not match the zone schema.
    #[error("corrupt zone record {id}: {reason}")]
    Corrupt { id: String, reason: String },
}

/// Errors surfaced by zone operations.
///
/// Every variant is recoverable at the boundary that issued the request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ZoneError {
    /// Rejected locally before any store round-trip.
    #[error("validation error: {0}")]
    Validation(String),

    /// The target zone does not exist (possibly deleted by another session).
    #[error("zone not found: {0}")]
    NotFound(ZoneId),

    #[error(transparent)]
    Storage(#[from] StoreError),
}

impl ZoneError {
    /// Whether the operator can retry the same action unchanged.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ZoneError::Storage(StoreError::Unavailable(_)))
    }
}

impl From<validator::ValidationErrors> for ZoneError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("{}: invalid value", field),
                })
            })
            .collect();
        messages.sort();
        ZoneError::Validation(messages.join(", "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use validator::{ValidationError, ValidationErrors};

    #[test]
    fn test_storage_error_is_retryable() {
        let err: ZoneError = StoreError::Unavailable("connection reset".into()).into();
        assert!(err.is_retryable());
        assert_eq!(err.to_string(), "store unavailable: connection reset");
    }

    #[test]
    fn test_validation_and_not_found_are_not_retryable() {
        assert!(!ZoneError::Validation("bad".into()).is_retryable());
        assert!(!ZoneError::NotFound(ZoneId::from("z1")).is_retryable());
        let corrupt = ZoneError::Storage(StoreError::Corrupt {
            id: "z1".into(),
            reason: "bad status".into(),
        });
        assert!(!corrupt.is_retryable());
    }

    #[test]
    fn test_from_validation_errors_uses_messages() {
        let mut errors = ValidationErrors::new();
        let mut err = ValidationError::new("latitude_range");
        err.message = Some("Latitude must be between -90 and 90".into());
        errors.add("latitude", err);

        let zone_err: ZoneError = errors.into();
        assert_eq!(
            zone_err,
            ZoneError::Validation("Latitude must be between -90 and 90".into())
        );
    }

    #[test]
    fn test_from_validation_errors_without_message() {
        let mut errors = ValidationErrors::new();
        errors.add("name", ValidationError::new("length"));

        let zone_err: ZoneError = errors.into();
        assert_eq!(zone_err, ZoneError::Validation("name: invalid value".into()));
    }
}
