//! Descriptor validation errors.

use thiserror::Error;

/// Errors raised while constructing or validating a resource descriptor.
///
/// Everything here is caught before any apply is attempted; a descriptor
/// that fails validation never reaches the graph builder.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The unit name is empty.
    #[error("unit name cannot be empty")]
    EmptyName,

    /// The unit name contains characters outside the allowed set.
    #[error("invalid unit name '{name}': {reason}")]
    InvalidName { name: String, reason: String },

    /// A required payload field is missing or empty.
    #[error("unit '{unit}': missing required field '{field}'")]
    MissingField { unit: String, field: &'static str },

    /// A payload field has a value that cannot be used.
    #[error("unit '{unit}': invalid value for '{field}': {reason}")]
    InvalidField {
        unit: String,
        field: &'static str,
        reason: String,
    },

    /// The unit lists itself as a dependency.
    #[error("unit '{unit}' depends on itself")]
    SelfDependency { unit: String },

    /// The unit claims the same produced identifier twice.
    #[error("unit '{unit}' declares output '{key}' more than once")]
    DuplicateOutput { unit: String, key: String },
}

impl ConfigurationError {
    pub(crate) fn missing(unit: &str, field: &'static str) -> Self {
        Self::MissingField {
            unit: unit.to_string(),
            field,
        }
    }

    pub(crate) fn invalid(unit: &str, field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidField {
            unit: unit.to_string(),
            field,
            reason: reason.into(),
        }
    }
}
