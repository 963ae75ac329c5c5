//! Error types for the rent engine.
//!
//! The calculators themselves only ever fail with a [`ValidationError`].
//! The wider [`Error`] type adds the failure modes of the storage
//! collaborator and configuration loading so that the service and API
//! layers can propagate everything through a single `Result`.

use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Type alias for Result using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// A rejected input field.
///
/// Always recoverable: the caller re-prompts the user for `field`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[error("{field} {reason}")]
pub struct ValidationError {
    /// Name of the offending field, as it appears in the serialized input.
    pub field: String,
    /// Human-readable reason, e.g. `"must not be negative"`.
    pub reason: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            reason: reason.into(),
        }
    }

    pub fn required(field: &str) -> Self {
        Self::new(field, "is required")
    }

    pub fn negative(field: &str) -> Self {
        Self::new(field, "must not be negative")
    }

    /// `field` drives an amount past what a [`rust_decimal::Decimal`] can
    /// hold.
    pub fn too_large(field: &str) -> Self {
        Self::new(field, "is too large to price")
    }
}

/// Root error type for the crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Input validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: Uuid },

    #[error("Storage operation failed: {0}")]
    Storage(String),

    #[error("Invalid pricing configuration: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_keeps_field_through_conversion() {
        let err: Error = ValidationError::negative("fuel_cost").into();
        match err {
            Error::Validation(v) => assert_eq!(v.field, "fuel_cost"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn validation_error_message_names_field() {
        let err = ValidationError::required("machine_type");
        assert_eq!(err.to_string(), "machine_type is required");
    }
}
