//! The schema document as delivered by the remote service.
//!
//! Documents are plain data: nothing here is validated. Use
//! [`EntitySchema::from_document`](crate::EntitySchema::from_document) to turn
//! one into a checked, immutable schema.

use crate::error::SchemaResult;
use crate::property::{PropertyKind, PropertyType};
use serde::{Deserialize, Serialize};

/// Raw metadata for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaDocument {
    /// Canonical entity name.
    pub name: String,
    /// Version / ETag-like token used for freshness comparison.
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logical_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[serde(alias = "public_entity_set_name")]
    pub entity_set_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_name: Option<String>,
    /// Key fields in serialization order.
    pub keys: Vec<KeyFieldDoc>,
    #[serde(default)]
    pub properties: Vec<PropertyDoc>,
}

/// One key field entry of a [`SchemaDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFieldDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
    #[serde(default = "default_mandatory")]
    pub mandatory: bool,
}

/// One property entry of a [`SchemaDocument`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyDoc {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: PropertyKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enum_name: Option<String>,
}

fn default_mandatory() -> bool {
    true
}

impl SchemaDocument {
    /// Creates an empty document for the given canonical name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: String::new(),
            logical_name: None,
            entity_set_name: None,
            collection_name: None,
            keys: Vec::new(),
            properties: Vec::new(),
        }
    }

    /// Parses a document from JSON.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serializes the document to JSON.
    pub fn to_json(&self) -> SchemaResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn with_logical_name(mut self, name: impl Into<String>) -> Self {
        self.logical_name = Some(name.into());
        self
    }

    pub fn with_entity_set_name(mut self, name: impl Into<String>) -> Self {
        self.entity_set_name = Some(name.into());
        self
    }

    pub fn with_collection_name(mut self, name: impl Into<String>) -> Self {
        self.collection_name = Some(name.into());
        self
    }

    /// Appends a key field. Order of calls is serialization order.
    pub fn with_key(mut self, key: KeyFieldDoc) -> Self {
        self.keys.push(key);
        self
    }

    pub fn with_property(mut self, name: impl Into<String>, property_type: &PropertyType) -> Self {
        self.properties.push(PropertyDoc::new(name, property_type));
        self
    }
}

impl KeyFieldDoc {
    /// A mandatory key field of the given type.
    pub fn new(name: impl Into<String>, property_type: &PropertyType) -> Self {
        Self {
            name: name.into(),
            kind: property_type.kind(),
            enum_name: property_type.enum_name().map(str::to_string),
            mandatory: true,
        }
    }

    /// Marks the field as optional.
    pub fn optional(mut self) -> Self {
        self.mandatory = false;
        self
    }
}

impl PropertyDoc {
    pub fn new(name: impl Into<String>, property_type: &PropertyType) -> Self {
        Self {
            name: name.into(),
            kind: property_type.kind(),
            enum_name: property_type.enum_name().map(str::to_string),
        }
    }
}
