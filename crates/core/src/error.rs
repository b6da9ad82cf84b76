//! Domain error model.

use serde::Serialize;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// One rejected input field (surfaced to clients as a validation detail).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldViolation {
    pub field: String,
    pub message: String,
    pub rejected_value: JsonValue,
}

impl FieldViolation {
    pub fn new(field: impl Into<String>, message: impl Into<String>, rejected_value: JsonValue) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            rejected_value,
        }
    }
}

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// conflicts, missing resources). Infrastructure concerns belong elsewhere.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value or state change failed validation.
    #[error("validation failed: {0}")]
    Validation(String),

    /// One or more input fields were rejected.
    #[error("validation failed: {} field(s) rejected", .0.len())]
    InvalidFields(Vec<FieldViolation>),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A requested resource was not found.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// A uniqueness or concurrency conflict.
    #[error("conflict: {0}")]
    Conflict(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(resource: &'static str) -> Self {
        Self::NotFound(resource)
    }

    /// Collapse a list of violations into a result (`Ok` when empty).
    pub fn check_fields(violations: Vec<FieldViolation>) -> DomainResult<()> {
        if violations.is_empty() {
            Ok(())
        } else {
            Err(Self::InvalidFields(violations))
        }
    }

    /// Field details for client-facing error envelopes.
    pub fn violations(&self) -> &[FieldViolation] {
        match self {
            Self::InvalidFields(v) => v,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_fields_passes_when_nothing_was_rejected() {
        assert!(DomainError::check_fields(Vec::new()).is_ok());
    }

    #[test]
    fn check_fields_keeps_every_violation() {
        let err = DomainError::check_fields(vec![
            FieldViolation::new("email", "must not be empty", JsonValue::from("")),
            FieldViolation::new("password", "too short", JsonValue::Null),
        ])
        .unwrap_err();

        assert_eq!(err.violations().len(), 2);
        assert_eq!(err.violations()[0].field, "email");
        assert_eq!(err.to_string(), "validation failed: 2 field(s) rejected");
    }
}
