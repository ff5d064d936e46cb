//! Validation and serialization errors.

use odmeta_model::PropertyType;
use std::fmt;
use thiserror::Error;

/// Result type for codec operations.
pub type SerializationResult<T> = Result<T, SerializationError>;

/// One problem found in a caller's key mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Violation {
    /// A mandatory key field was not supplied.
    Missing { field: String },
    /// A supplied field is not part of the entity's key.
    Unexpected { field: String },
    /// A value cannot be converted to its field's type without loss.
    InvalidValue {
        field: String,
        expected: PropertyType,
        reason: String,
    },
}

impl Violation {
    /// The field the violation is about.
    pub fn field(&self) -> &str {
        match self {
            Violation::Missing { field }
            | Violation::Unexpected { field }
            | Violation::InvalidValue { field, .. } => field,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Violation::Missing { field } => write!(f, "missing key field {field}"),
            Violation::Unexpected { field } => write!(f, "unexpected field {field}"),
            Violation::InvalidValue {
                field,
                expected,
                reason,
            } => write!(f, "{field}: expected {expected}, {reason}"),
        }
    }
}

/// A key mapping that failed validation. Carries every violation found.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid key for {entity}: {}", join(.violations))]
pub struct ValidationError {
    pub entity: String,
    pub violations: Vec<Violation>,
}

fn join(violations: &[Violation]) -> String {
    violations
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// A value that cannot be rendered as, or parsed from, a wire literal.
///
/// Once a key has passed validation these indicate a defect, not bad input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SerializationError {
    #[error("cannot serialize a {actual} value as {expected}")]
    TypeMismatch { expected: String, actual: String },

    #[error("{type_name} value is not serializable: {reason}")]
    Unsupported { type_name: String, reason: String },

    #[error("invalid {type_name} literal {literal:?}: {reason}")]
    InvalidLiteral {
        type_name: String,
        literal: String,
        reason: String,
    },

    #[error("invalid {type_name} value: {reason}")]
    InvalidValue { type_name: String, reason: String },

    #[error("key for {entity} has no fields")]
    EmptyKey { entity: String },
}
