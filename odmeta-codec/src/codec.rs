//! Per-type codecs.
//!
//! Every [`PropertyType`] maps to exactly one static codec through
//! [`codec_for`]. The match is exhaustive, so adding a type tag without a
//! codec fails to compile.

use crate::error::{SerializationError, SerializationResult};
use crate::value::KeyValue;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use chrono::{DateTime, NaiveDate, NaiveDateTime, SecondsFormat, Utc};
use odmeta_model::{PropertyKind, PropertyType};
use serde_json::Value;
use std::num::IntErrorKind;
use uuid::Uuid;

/// Largest magnitude an `f64` holds without skipping integers.
const MAX_EXACT_F64_INT: f64 = 9_007_199_254_740_992.0;

/// Conversion rules for one property type.
pub trait TypeCodec: Send + Sync {
    /// The tag this codec handles.
    fn kind(&self) -> PropertyKind;

    /// Converts a raw JSON value into a typed value.
    ///
    /// Fails with a human-readable reason when the conversion would lose
    /// information or the input has the wrong shape.
    fn coerce(&self, raw: &Value) -> Result<KeyValue, String>;

    /// Renders a typed value as a wire literal.
    fn encode(&self, value: &KeyValue) -> SerializationResult<String>;

    /// Parses a wire literal produced by [`encode`](Self::encode).
    fn decode(&self, literal: &str) -> SerializationResult<KeyValue>;
}

/// Returns the codec for a property type.
pub fn codec_for(ty: &PropertyType) -> &'static dyn TypeCodec {
    match ty {
        PropertyType::String => &StringCodec,
        PropertyType::Int32 => &Int32Codec,
        PropertyType::Int64 => &Int64Codec,
        PropertyType::Real => &RealCodec,
        PropertyType::Date => &DateCodec,
        PropertyType::DateTime => &DateTimeCodec,
        PropertyType::Enum(_) => &EnumCodec,
        PropertyType::Guid => &GuidCodec,
        PropertyType::Binary => &BinaryCodec,
        PropertyType::Boolean => &BooleanCodec,
    }
}

fn json_kind(raw: &Value) -> &'static str {
    match raw {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

fn mismatch(kind: PropertyKind, value: &KeyValue) -> SerializationError {
    SerializationError::TypeMismatch {
        expected: kind.to_string(),
        actual: value.kind().to_string(),
    }
}

fn bad_literal(kind: PropertyKind, literal: &str, reason: impl Into<String>) -> SerializationError {
    SerializationError::InvalidLiteral {
        type_name: kind.to_string(),
        literal: literal.to_string(),
        reason: reason.into(),
    }
}

/// Strips one pair of single quotes, or fails.
fn unquote<'a>(kind: PropertyKind, literal: &'a str) -> SerializationResult<&'a str> {
    literal
        .strip_prefix('\'')
        .and_then(|s| s.strip_suffix('\''))
        .ok_or_else(|| bad_literal(kind, literal, "expected a single-quoted literal"))
}

// ── String ───────────────────────────────────────────────────────

struct StringCodec;

impl TypeCodec for StringCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::String
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::String(s) => Ok(KeyValue::String(s.clone())),
            Value::Number(n) => Ok(KeyValue::String(n.to_string())),
            Value::Bool(b) => Ok(KeyValue::String(b.to_string())),
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::String(s) => Ok(format!("'{}'", urlencoding::encode(s))),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        let inner = unquote(self.kind(), literal)?;
        urlencoding::decode(inner)
            .map(|s| KeyValue::String(s.into_owned()))
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

// ── Integers ─────────────────────────────────────────────────────

/// Converts a JSON number or integer literal to an `i64` within `[min, max]`.
fn coerce_integer(raw: &Value, min: i64, max: i64) -> Result<i64, String> {
    let value = match raw {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                i
            } else if n.is_u64() {
                return Err(format!("{n} is out of range"));
            } else {
                let f = n.as_f64().unwrap_or(f64::NAN);
                if f.fract() != 0.0 {
                    return Err(format!("{n} has a fractional component"));
                }
                if f.abs() > MAX_EXACT_F64_INT {
                    return Err(format!("{n} is out of range"));
                }
                f as i64
            }
        }
        Value::String(s) => match s.parse::<i64>() {
            Ok(i) => i,
            Err(e) => {
                return Err(match e.kind() {
                    IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
                        format!("{s:?} is out of range")
                    }
                    _ => match s.parse::<f64>() {
                        Ok(f) if f.is_finite() && f.fract() != 0.0 => {
                            format!("{s:?} has a fractional component")
                        }
                        _ => format!("{s:?} is not an integer literal"),
                    },
                });
            }
        },
        other => return Err(format!("got {}", json_kind(other))),
    };
    if value < min || value > max {
        return Err(format!("{value} is out of range"));
    }
    Ok(value)
}

struct Int32Codec;

impl TypeCodec for Int32Codec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Int32
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        let v = coerce_integer(raw, i64::from(i32::MIN), i64::from(i32::MAX))?;
        i32::try_from(v)
            .map(KeyValue::Int32)
            .map_err(|_| format!("{v} is out of range"))
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Int32(v) => Ok(v.to_string()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        literal
            .parse::<i32>()
            .map(KeyValue::Int32)
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

struct Int64Codec;

impl TypeCodec for Int64Codec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Int64
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        coerce_integer(raw, i64::MIN, i64::MAX).map(KeyValue::Int64)
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Int64(v) => Ok(v.to_string()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        literal
            .parse::<i64>()
            .map(KeyValue::Int64)
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

// ── Real ─────────────────────────────────────────────────────────

struct RealCodec;

impl TypeCodec for RealCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Real
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::Number(n) => {
                // Integers past 2^53 may not survive the trip through f64.
                if let Some(i) = n.as_i64() {
                    if (i as f64) as i128 != i128::from(i) {
                        return Err(format!("{n} cannot be represented exactly"));
                    }
                } else if let Some(u) = n.as_u64() {
                    if (u as f64) as i128 != i128::from(u) {
                        return Err(format!("{n} cannot be represented exactly"));
                    }
                }
                n.as_f64()
                    .filter(|f| f.is_finite())
                    .map(KeyValue::Real)
                    .ok_or_else(|| format!("{n} is not a finite number"))
            }
            Value::String(s) => match s.parse::<f64>() {
                Ok(f) if f.is_finite() => Ok(KeyValue::Real(f)),
                Ok(_) => Err(format!("{s:?} is not a finite number")),
                Err(_) => Err(format!("{s:?} is not a number")),
            },
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Real(f) if f.is_finite() => Ok(format_real(*f)),
            KeyValue::Real(f) => Err(SerializationError::Unsupported {
                type_name: self.kind().to_string(),
                reason: format!("{f} has no wire literal"),
            }),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        match literal.parse::<f64>() {
            Ok(f) if f.is_finite() => Ok(KeyValue::Real(f)),
            Ok(_) => Err(bad_literal(self.kind(), literal, "not a finite number")),
            Err(e) => Err(bad_literal(self.kind(), literal, e.to_string())),
        }
    }
}

/// Shortest round-trip decimal, switching to exponent form outside
/// `[1e-6, 1e21)`.
fn format_real(f: f64) -> String {
    let magnitude = f.abs();
    if magnitude != 0.0 && !(1e-6..1e21).contains(&magnitude) {
        format!("{f:e}")
    } else {
        f.to_string()
    }
}

// ── Date / DateTime ──────────────────────────────────────────────

const DATE_FORMAT: &str = "%Y-%m-%d";
const NAIVE_DATE_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

struct DateCodec;

impl TypeCodec for DateCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Date
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::String(s) => NaiveDate::parse_from_str(s, DATE_FORMAT)
                .map(KeyValue::Date)
                .map_err(|_| format!("{s:?} is not a YYYY-MM-DD date")),
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Date(d) => Ok(d.format(DATE_FORMAT).to_string()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        NaiveDate::parse_from_str(literal, DATE_FORMAT)
            .map(KeyValue::Date)
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

struct DateTimeCodec;

impl TypeCodec for DateTimeCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::DateTime
    }

    /// Accepts RFC 3339 with any offset, or a naive timestamp taken as UTC.
    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::String(s) => DateTime::parse_from_rfc3339(s)
                .map(|dt| dt.with_timezone(&Utc))
                .or_else(|_| {
                    NaiveDateTime::parse_from_str(s, NAIVE_DATE_TIME_FORMAT).map(|n| n.and_utc())
                })
                .map(KeyValue::DateTime)
                .map_err(|_| format!("{s:?} is not an ISO-8601 date-time")),
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::DateTime(dt) => Ok(dt.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        DateTime::parse_from_rfc3339(literal)
            .map(|dt| KeyValue::DateTime(dt.with_timezone(&Utc)))
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

// ── Enum ─────────────────────────────────────────────────────────

struct EnumCodec;

impl TypeCodec for EnumCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Enum
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::String(s) if s.trim().is_empty() => Err("got an empty member name".into()),
            Value::String(s) => Ok(KeyValue::Enum(s.clone())),
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Enum(member) => Ok(urlencoding::encode(member).into_owned()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        if literal.is_empty() {
            return Err(bad_literal(self.kind(), literal, "empty member name"));
        }
        urlencoding::decode(literal)
            .map(|s| KeyValue::Enum(s.into_owned()))
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

// ── Guid ─────────────────────────────────────────────────────────

struct GuidCodec;

impl TypeCodec for GuidCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Guid
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::String(s) => Uuid::parse_str(s)
                .map(KeyValue::Guid)
                .map_err(|_| format!("{s:?} is not a GUID")),
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Guid(id) => Ok(format!("guid'{}'", id.hyphenated())),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        let inner = literal
            .strip_prefix("guid'")
            .and_then(|s| s.strip_suffix('\''))
            .ok_or_else(|| bad_literal(self.kind(), literal, "expected guid'...'"))?;
        Uuid::parse_str(inner)
            .map(KeyValue::Guid)
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

// ── Binary ───────────────────────────────────────────────────────

struct BinaryCodec;

impl TypeCodec for BinaryCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Binary
    }

    /// Accepts a base64 string or an array of byte values.
    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::String(s) => BASE64
                .decode(s)
                .map(KeyValue::Binary)
                .map_err(|_| format!("{s:?} is not valid base64")),
            Value::Array(items) => items
                .iter()
                .map(|item| {
                    item.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| format!("array element {item} is not a byte"))
                })
                .collect::<Result<Vec<u8>, String>>()
                .map(KeyValue::Binary),
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Binary(bytes) => Ok(format!("'{}'", BASE64.encode(bytes))),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        let inner = unquote(self.kind(), literal)?;
        BASE64
            .decode(inner)
            .map(KeyValue::Binary)
            .map_err(|e| bad_literal(self.kind(), literal, e.to_string()))
    }
}

// ── Boolean ──────────────────────────────────────────────────────

struct BooleanCodec;

impl TypeCodec for BooleanCodec {
    fn kind(&self) -> PropertyKind {
        PropertyKind::Boolean
    }

    fn coerce(&self, raw: &Value) -> Result<KeyValue, String> {
        match raw {
            Value::Bool(b) => Ok(KeyValue::Boolean(*b)),
            Value::String(s) if s.eq_ignore_ascii_case("true") => Ok(KeyValue::Boolean(true)),
            Value::String(s) if s.eq_ignore_ascii_case("false") => Ok(KeyValue::Boolean(false)),
            Value::String(s) => Err(format!("{s:?} is not true or false")),
            other => Err(format!("got {}", json_kind(other))),
        }
    }

    fn encode(&self, value: &KeyValue) -> SerializationResult<String> {
        match value {
            KeyValue::Boolean(b) => Ok(b.to_string()),
            other => Err(mismatch(self.kind(), other)),
        }
    }

    fn decode(&self, literal: &str) -> SerializationResult<KeyValue> {
        match literal {
            "true" => Ok(KeyValue::Boolean(true)),
            "false" => Ok(KeyValue::Boolean(false)),
            _ => Err(bad_literal(self.kind(), literal, "expected true or false")),
        }
    }
}
