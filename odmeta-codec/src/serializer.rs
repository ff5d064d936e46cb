//! Wire serialization of typed values and validated keys.

use crate::codec::codec_for;
use crate::error::{SerializationError, SerializationResult};
use crate::validator::ValidatedKey;
use crate::value::KeyValue;
use odmeta_model::PropertyType;
use serde_json::Value;

/// How a key predicate is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyFormat {
    /// Always `Field=literal`, comma separated.
    #[default]
    Named,
    /// A single-field key is written as the bare literal. Composite keys
    /// are still named.
    BareSingle,
}

/// Renders a typed value as a wire literal for `ty`.
pub fn serialize_value(ty: &PropertyType, value: &KeyValue) -> SerializationResult<String> {
    codec_for(ty).encode(value)
}

/// Converts a raw JSON value to `ty` and renders it.
pub fn serialize_json(ty: &PropertyType, raw: &Value) -> SerializationResult<String> {
    let codec = codec_for(ty);
    let value = codec
        .coerce(raw)
        .map_err(|reason| SerializationError::InvalidValue {
            type_name: ty.to_string(),
            reason,
        })?;
    codec.encode(&value)
}

/// Parses a wire literal back into a typed value.
pub fn parse_literal(ty: &PropertyType, literal: &str) -> SerializationResult<KeyValue> {
    codec_for(ty).decode(literal)
}

/// Renders a validated key as a predicate, e.g. `A='x',B=2`.
///
/// Fields appear in the schema's key order.
pub fn serialize_key(key: &ValidatedKey, format: KeyFormat) -> SerializationResult<String> {
    if key.is_empty() {
        return Err(SerializationError::EmptyKey {
            entity: key.entity().to_string(),
        });
    }

    if format == KeyFormat::BareSingle && key.len() == 1 {
        let part = &key.parts()[0];
        return serialize_value(part.property_type(), part.value());
    }

    let mut pairs = Vec::with_capacity(key.len());
    for part in key.parts() {
        let literal = serialize_value(part.property_type(), part.value())?;
        pairs.push(format!("{}={}", part.name(), literal));
    }
    Ok(pairs.join(","))
}

/// Renders `EntitySet(predicate)` for addressing a single record.
pub fn key_segment(
    entity_set: &str,
    key: &ValidatedKey,
    format: KeyFormat,
) -> SerializationResult<String> {
    Ok(format!("{entity_set}({})", serialize_key(key, format)?))
}
