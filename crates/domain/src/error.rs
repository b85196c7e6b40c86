//! Common error types used across the workspace.

use crate::id::DeviceId;

/// Top-level error for all lumen operations.
///
/// Each layer defines its own typed errors and converts via `#[from]`;
/// `String` variants are deliberately avoided.
#[derive(Debug, thiserror::Error)]
pub enum LumenError {
    /// A domain invariant was violated by the caller's input.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The referenced entity does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// The storage adapter failed.
    #[error("storage error")]
    Storage(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A bounded storage operation exceeded its deadline.
    #[error("timeout")]
    Timeout(#[from] TimeoutError),

    /// The registry and audit log diverged mid-transition. Never retried
    /// automatically; surfaced so an operator is alerted.
    #[error("inconsistency")]
    Inconsistency(#[from] InconsistencyError),
}

/// Domain invariant violations.
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("name must not be empty")]
    EmptyName,
    #[error("device id must not be empty")]
    EmptyDeviceId,
    #[error("device id must not contain whitespace: {0:?}")]
    InvalidDeviceId(String),
    #[error("a device with id {0:?} is already registered")]
    DuplicateDeviceId(String),
    #[error("brightness must be within 0..=100, got {0}")]
    BrightnessOutOfRange(u8),
    #[error("color must be a hex string like #ffd700, got {0:?}")]
    InvalidColor(String),
    #[error("schedule must run on at least one day")]
    NoDays,
    #[error("time must be HH:MM or HH:MM:SS, got {0:?}")]
    InvalidTime(String),
    #[error("user id must be a valid UUID, got {0:?}")]
    InvalidUserId(String),
}

/// A lookup by identifier found nothing.
#[derive(Debug, thiserror::Error)]
#[error("{entity} not found: {id}")]
pub struct NotFoundError {
    /// Kind of entity that was looked up (e.g. `"Device"`).
    pub entity: &'static str,
    /// The identifier that failed to resolve.
    pub id: String,
}

/// A storage operation did not complete within its deadline.
#[derive(Debug, thiserror::Error)]
#[error("operation timed out: {operation}")]
pub struct TimeoutError {
    /// Which step exceeded its deadline (e.g. `"audit append"`).
    pub operation: &'static str,
}

/// An audit record was written but the matching registry update failed.
#[derive(Debug, thiserror::Error)]
#[error("device {device_id} left inconsistent: {detail}")]
pub struct InconsistencyError {
    pub device_id: DeviceId,
    pub detail: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_format_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Device",
            id: "lr1".to_string(),
        };
        assert_eq!(err.to_string(), "Device not found: lr1");
    }

    #[test]
    fn should_convert_validation_error_into_lumen_error() {
        let err: LumenError = ValidationError::BrightnessOutOfRange(150).into();
        assert!(matches!(
            err,
            LumenError::Validation(ValidationError::BrightnessOutOfRange(150))
        ));
    }

    #[test]
    fn should_format_brightness_validation_error() {
        let err = ValidationError::BrightnessOutOfRange(150);
        assert_eq!(err.to_string(), "brightness must be within 0..=100, got 150");
    }
}
