//! Key validation.
//!
//! [`validate_key`] never stops at the first problem: it reports missing
//! mandatory fields, then unexpected fields, then values that do not convert
//! to their field's type, all in one [`ValidationError`].

use crate::codec::codec_for;
use crate::error::{ValidationError, Violation};
use crate::value::KeyValue;
use odmeta_model::{EntitySchema, PropertyType};
use serde_json::{Map, Value};

/// One typed component of a validated key.
#[derive(Debug, Clone, PartialEq)]
pub struct KeyPart {
    name: String,
    property_type: PropertyType,
    value: KeyValue,
}

impl KeyPart {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub fn value(&self) -> &KeyValue {
        &self.value
    }
}

/// A key mapping that passed validation, in the schema's key field order.
///
/// Only [`validate_key`] produces these, so every value already matches its
/// field's type.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedKey {
    entity: String,
    parts: Vec<KeyPart>,
}

impl ValidatedKey {
    /// Canonical name of the entity the key belongs to.
    pub fn entity(&self) -> &str {
        &self.entity
    }

    pub fn parts(&self) -> &[KeyPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&KeyValue> {
        self.parts.iter().find(|p| p.name == field).map(|p| &p.value)
    }
}

/// Validates a caller-supplied key mapping against `schema`.
///
/// Field names match exactly (case-sensitive). Optional key fields may be
/// left out; they are then absent from the result.
pub fn validate_key(
    schema: &EntitySchema,
    key_values: &Map<String, Value>,
) -> Result<ValidatedKey, ValidationError> {
    let mut violations = Vec::new();

    for field in schema.key_fields() {
        if field.is_mandatory() && !key_values.contains_key(field.name()) {
            violations.push(Violation::Missing {
                field: field.name().to_string(),
            });
        }
    }

    let mut unexpected: Vec<&String> = key_values
        .keys()
        .filter(|name| !schema.is_key_field(name))
        .collect();
    unexpected.sort();
    violations.extend(unexpected.into_iter().map(|name| Violation::Unexpected {
        field: name.clone(),
    }));

    let mut parts = Vec::with_capacity(schema.key_fields().len());
    for field in schema.key_fields() {
        let Some(raw) = key_values.get(field.name()) else {
            continue;
        };
        match codec_for(field.property_type()).coerce(raw) {
            Ok(value) => parts.push(KeyPart {
                name: field.name().to_string(),
                property_type: field.property_type().clone(),
                value,
            }),
            Err(reason) => violations.push(Violation::InvalidValue {
                field: field.name().to_string(),
                expected: field.property_type().clone(),
                reason,
            }),
        }
    }

    if !violations.is_empty() {
        return Err(ValidationError {
            entity: schema.canonical_name().to_string(),
            violations,
        });
    }

    Ok(ValidatedKey {
        entity: schema.canonical_name().to_string(),
        parts,
    })
}
