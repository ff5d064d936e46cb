use chrono::{DateTime, NaiveDate, Utc};
use odmeta_model::{PropertyKind, PropertyType};
use uuid::Uuid;

/// A key value converted to the type its field declares.
#[derive(Debug, Clone, PartialEq)]
pub enum KeyValue {
    String(String),
    Int32(i32),
    Int64(i64),
    Real(f64),
    Date(NaiveDate),
    DateTime(DateTime<Utc>),
    /// Symbolic enum member name.
    Enum(String),
    Guid(Uuid),
    Binary(Vec<u8>),
    Boolean(bool),
}

impl KeyValue {
    /// Shorthand for an enum member.
    pub fn enum_member(name: impl Into<String>) -> Self {
        KeyValue::Enum(name.into())
    }

    /// The type tag this value belongs to.
    pub fn kind(&self) -> PropertyKind {
        match self {
            KeyValue::String(_) => PropertyKind::String,
            KeyValue::Int32(_) => PropertyKind::Int32,
            KeyValue::Int64(_) => PropertyKind::Int64,
            KeyValue::Real(_) => PropertyKind::Real,
            KeyValue::Date(_) => PropertyKind::Date,
            KeyValue::DateTime(_) => PropertyKind::DateTime,
            KeyValue::Enum(_) => PropertyKind::Enum,
            KeyValue::Guid(_) => PropertyKind::Guid,
            KeyValue::Binary(_) => PropertyKind::Binary,
            KeyValue::Boolean(_) => PropertyKind::Boolean,
        }
    }

    /// Whether this value can be serialized as `ty`.
    pub fn matches(&self, ty: &PropertyType) -> bool {
        self.kind() == ty.kind()
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::String(s.to_string())
    }
}

impl From<String> for KeyValue {
    fn from(s: String) -> Self {
        KeyValue::String(s)
    }
}

impl From<i32> for KeyValue {
    fn from(v: i32) -> Self {
        KeyValue::Int32(v)
    }
}

impl From<i64> for KeyValue {
    fn from(v: i64) -> Self {
        KeyValue::Int64(v)
    }
}

impl From<f64> for KeyValue {
    fn from(v: f64) -> Self {
        KeyValue::Real(v)
    }
}

impl From<bool> for KeyValue {
    fn from(v: bool) -> Self {
        KeyValue::Boolean(v)
    }
}

impl From<NaiveDate> for KeyValue {
    fn from(v: NaiveDate) -> Self {
        KeyValue::Date(v)
    }
}

impl From<DateTime<Utc>> for KeyValue {
    fn from(v: DateTime<Utc>) -> Self {
        KeyValue::DateTime(v)
    }
}

impl From<Uuid> for KeyValue {
    fn from(v: Uuid) -> Self {
        KeyValue::Guid(v)
    }
}

impl From<Vec<u8>> for KeyValue {
    fn from(v: Vec<u8>) -> Self {
        KeyValue::Binary(v)
    }
}
