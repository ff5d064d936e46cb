//! Schema construction errors.

use crate::alias::AliasKind;
use thiserror::Error;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A schema document that is malformed or contradicts itself or the catalog.
///
/// These are never retried automatically: the same document would fail
/// the same way on the next attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("schema document has no entity name")]
    MissingName,

    #[error("entity {entity} declares no key fields")]
    NoKeyFields { entity: String },

    #[error("entity {entity} has a field with an empty name")]
    EmptyFieldName { entity: String },

    #[error("entity {entity} declares key field {field} more than once")]
    DuplicateKeyField { entity: String, field: String },

    #[error("entity {entity} declares property {property} more than once")]
    DuplicateProperty { entity: String, property: String },

    #[error("entity {entity}: enum field {field} has no enum_name")]
    MissingEnumName { entity: String, field: String },

    #[error(
        "entity {entity}: key field {field} is {key_type} but the property map says {property_type}"
    )]
    KeyTypeConflict {
        entity: String,
        field: String,
        key_type: String,
        property_type: String,
    },

    #[error("{kind} {alias:?} is claimed by both {existing} and {incoming}")]
    DuplicateAlias {
        alias: String,
        kind: AliasKind,
        existing: String,
        incoming: String,
    },

    #[error("invalid schema document: {0}")]
    InvalidDocument(String),
}

impl From<serde_json::Error> for SchemaError {
    fn from(err: serde_json::Error) -> Self {
        SchemaError::InvalidDocument(err.to_string())
    }
}
