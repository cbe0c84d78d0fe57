//! Validation error types.
//!
//! Configuration problems are reported per field so clients can highlight the
//! offending inputs.

use serde::{Deserialize, Serialize};

/// One rejected field with a human-readable explanation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Path of the rejected field, e.g. `maxCapacity` or `events[1].name`.
    pub field: String,
    /// Why the field was rejected.
    pub message: String,
}

impl FieldError {
    /// Creates an error for `field` with `message`.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// The full set of validation failures for one configuration request.
#[derive(Debug, Clone, Default, PartialEq, Eq, thiserror::Error)]
#[error("configuration validation failed")]
pub struct ValidationErrors {
    /// All field-level failures, in field order of the request.
    pub errors: Vec<FieldError>,
}

impl ValidationErrors {
    /// Records a failure for `field`.
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    /// True when no failure has been recorded.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    /// Consumes the collector: `Ok(())` when empty, `Err(self)` otherwise.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_collector_is_ok() {
        let errors = ValidationErrors::default();
        assert!(errors.is_empty());
        assert!(errors.into_result().is_ok());
    }

    #[test]
    fn test_collector_keeps_insertion_order() {
        let mut errors = ValidationErrors::default();
        errors.push("maxCapacity", "Maximum ticket capacity must be provided");
        errors.push("events", "At least one event must be configured");

        let err = errors.into_result().unwrap_err();
        assert_eq!(err.errors.len(), 2);
        assert_eq!(err.errors[0].field, "maxCapacity");
        assert_eq!(err.errors[1].field, "events");
    }
}
