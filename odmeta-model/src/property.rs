use serde::{Deserialize, Serialize};
use std::fmt;

/// The primitive type carried by a key field or property.
///
/// Each variant holds exactly what the codec needs to validate and
/// serialize a value; only `Enum` needs extra data (the enum type name).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PropertyType {
    String,
    Int32,
    Int64,
    Real,
    Date,
    DateTime,
    Enum(String),
    Guid,
    Binary,
    Boolean,
}

/// The bare type tag of a [`PropertyType`], as it appears in schema documents.
///
/// The enum type name lives next to the tag rather than inside it so the JSON
/// stays flat: `{"type": "enum", "enum_name": "NoYes"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyKind {
    String,
    Int32,
    Int64,
    Real,
    Date,
    DateTime,
    Enum,
    Guid,
    Binary,
    Boolean,
}

impl PropertyType {
    /// Builds a type from its document tag and optional enum name.
    ///
    /// Returns `None` for an `Enum` tag without a name. A name supplied
    /// for any other tag is ignored.
    pub fn from_parts(kind: PropertyKind, enum_name: Option<&str>) -> Option<Self> {
        Some(match kind {
            PropertyKind::String => PropertyType::String,
            PropertyKind::Int32 => PropertyType::Int32,
            PropertyKind::Int64 => PropertyType::Int64,
            PropertyKind::Real => PropertyType::Real,
            PropertyKind::Date => PropertyType::Date,
            PropertyKind::DateTime => PropertyType::DateTime,
            PropertyKind::Enum => {
                let name = enum_name.map(str::trim).filter(|n| !n.is_empty())?;
                PropertyType::Enum(name.to_string())
            }
            PropertyKind::Guid => PropertyType::Guid,
            PropertyKind::Binary => PropertyType::Binary,
            PropertyKind::Boolean => PropertyType::Boolean,
        })
    }

    /// Shorthand for an enum type.
    pub fn enumeration(name: impl Into<String>) -> Self {
        PropertyType::Enum(name.into())
    }

    /// The document tag for this type.
    pub fn kind(&self) -> PropertyKind {
        match self {
            PropertyType::String => PropertyKind::String,
            PropertyType::Int32 => PropertyKind::Int32,
            PropertyType::Int64 => PropertyKind::Int64,
            PropertyType::Real => PropertyKind::Real,
            PropertyType::Date => PropertyKind::Date,
            PropertyType::DateTime => PropertyKind::DateTime,
            PropertyType::Enum(_) => PropertyKind::Enum,
            PropertyType::Guid => PropertyKind::Guid,
            PropertyType::Binary => PropertyKind::Binary,
            PropertyType::Boolean => PropertyKind::Boolean,
        }
    }

    /// The enum type name, for `Enum` types only.
    pub fn enum_name(&self) -> Option<&str> {
        match self {
            PropertyType::Enum(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for PropertyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PropertyKind::String => "string",
            PropertyKind::Int32 => "int32",
            PropertyKind::Int64 => "int64",
            PropertyKind::Real => "real",
            PropertyKind::Date => "date",
            PropertyKind::DateTime => "date_time",
            PropertyKind::Enum => "enum",
            PropertyKind::Guid => "guid",
            PropertyKind::Binary => "binary",
            PropertyKind::Boolean => "boolean",
        };
        f.write_str(s)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyType::Enum(name) => write!(f, "enum({name})"),
            other => other.kind().fmt(f),
        }
    }
}
