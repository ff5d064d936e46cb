use crate::alias::AliasKind;
use crate::document::{KeyFieldDoc, PropertyDoc, SchemaDocument};
use crate::error::{SchemaError, SchemaResult};
use crate::property::PropertyType;
use std::collections::{BTreeMap, HashSet};

/// One field of an entity's primary key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyField {
    name: String,
    property_type: PropertyType,
    mandatory: bool,
    ordinal: usize,
}

impl KeyField {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn property_type(&self) -> &PropertyType {
        &self.property_type
    }

    pub fn is_mandatory(&self) -> bool {
        self.mandatory
    }

    /// Zero-based position in the key; composite keys serialize in this order.
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }
}

/// Immutable descriptor of one entity.
///
/// Built from a [`SchemaDocument`] and never changed afterwards. Callers share
/// it behind an `Arc`; a refreshed document yields a new instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntitySchema {
    canonical_name: String,
    logical_name: Option<String>,
    entity_set_name: Option<String>,
    collection_name: Option<String>,
    key_fields: Vec<KeyField>,
    properties: BTreeMap<String, PropertyType>,
    version: String,
}

impl EntitySchema {
    /// Checks a document and builds the schema it describes.
    ///
    /// Key fields keep document order. Key fields missing from the property
    /// list are added to the property map; a key field whose type disagrees
    /// with its property entry is rejected.
    pub fn from_document(doc: SchemaDocument) -> SchemaResult<Self> {
        let canonical_name = doc.name.trim().to_string();
        if canonical_name.is_empty() {
            return Err(SchemaError::MissingName);
        }
        if doc.keys.is_empty() {
            return Err(SchemaError::NoKeyFields {
                entity: canonical_name,
            });
        }

        let mut properties = BTreeMap::new();
        for prop in &doc.properties {
            let property_type = property_type_of(&canonical_name, prop)?;
            if properties.insert(prop.name.clone(), property_type).is_some() {
                return Err(SchemaError::DuplicateProperty {
                    entity: canonical_name,
                    property: prop.name.clone(),
                });
            }
        }

        let mut seen = HashSet::new();
        let mut key_fields = Vec::with_capacity(doc.keys.len());
        for (ordinal, key) in doc.keys.iter().enumerate() {
            let property_type = key_type_of(&canonical_name, key)?;
            if !seen.insert(key.name.as_str()) {
                return Err(SchemaError::DuplicateKeyField {
                    entity: canonical_name,
                    field: key.name.clone(),
                });
            }
            match properties.get(&key.name) {
                Some(existing) if *existing != property_type => {
                    return Err(SchemaError::KeyTypeConflict {
                        entity: canonical_name,
                        field: key.name.clone(),
                        key_type: property_type.to_string(),
                        property_type: existing.to_string(),
                    });
                }
                Some(_) => {}
                None => {
                    properties.insert(key.name.clone(), property_type.clone());
                }
            }
            key_fields.push(KeyField {
                name: key.name.clone(),
                property_type,
                mandatory: key.mandatory,
                ordinal,
            });
        }

        Ok(Self {
            canonical_name,
            logical_name: non_empty(doc.logical_name),
            entity_set_name: non_empty(doc.entity_set_name),
            collection_name: non_empty(doc.collection_name),
            key_fields,
            properties,
            version: doc.version,
        })
    }

    /// Rebuilds the document this schema was created from.
    ///
    /// Properties come back sorted by name; key order is preserved.
    pub fn to_document(&self) -> SchemaDocument {
        SchemaDocument {
            name: self.canonical_name.clone(),
            version: self.version.clone(),
            logical_name: self.logical_name.clone(),
            entity_set_name: self.entity_set_name.clone(),
            collection_name: self.collection_name.clone(),
            keys: self
                .key_fields
                .iter()
                .map(|k| {
                    let doc = KeyFieldDoc::new(k.name.clone(), &k.property_type);
                    if k.mandatory { doc } else { doc.optional() }
                })
                .collect(),
            properties: self
                .properties
                .iter()
                .map(|(name, ty)| PropertyDoc::new(name.clone(), ty))
                .collect(),
        }
    }

    pub fn canonical_name(&self) -> &str {
        &self.canonical_name
    }

    pub fn logical_name(&self) -> Option<&str> {
        self.logical_name.as_deref()
    }

    pub fn entity_set_name(&self) -> Option<&str> {
        self.entity_set_name.as_deref()
    }

    pub fn collection_name(&self) -> Option<&str> {
        self.collection_name.as_deref()
    }

    /// Every name this entity answers to, tagged with its kind.
    /// The canonical name comes first.
    pub fn names(&self) -> impl Iterator<Item = (AliasKind, &str)> {
        [
            (AliasKind::Canonical, Some(self.canonical_name.as_str())),
            (AliasKind::Logical, self.logical_name.as_deref()),
            (AliasKind::EntitySet, self.entity_set_name.as_deref()),
            (AliasKind::Collection, self.collection_name.as_deref()),
        ]
        .into_iter()
        .filter_map(|(kind, name)| name.map(|n| (kind, n)))
    }

    /// Key fields in serialization order.
    pub fn key_fields(&self) -> &[KeyField] {
        &self.key_fields
    }

    pub fn key_field(&self, name: &str) -> Option<&KeyField> {
        self.key_fields.iter().find(|k| k.name == name)
    }

    pub fn is_key_field(&self, name: &str) -> bool {
        self.key_field(name).is_some()
    }

    pub fn is_composite_key(&self) -> bool {
        self.key_fields.len() > 1
    }

    pub fn property_type(&self, name: &str) -> Option<&PropertyType> {
        self.properties.get(name)
    }

    pub fn properties(&self) -> &BTreeMap<String, PropertyType> {
        &self.properties
    }

    pub fn version(&self) -> &str {
        &self.version
    }
}

fn key_type_of(entity: &str, key: &KeyFieldDoc) -> SchemaResult<PropertyType> {
    resolve_type(entity, &key.name, key.kind, key.enum_name.as_deref())
}

fn property_type_of(entity: &str, prop: &PropertyDoc) -> SchemaResult<PropertyType> {
    resolve_type(entity, &prop.name, prop.kind, prop.enum_name.as_deref())
}

fn resolve_type(
    entity: &str,
    field: &str,
    kind: crate::property::PropertyKind,
    enum_name: Option<&str>,
) -> SchemaResult<PropertyType> {
    if field.trim().is_empty() {
        return Err(SchemaError::EmptyFieldName {
            entity: entity.to_string(),
        });
    }
    PropertyType::from_parts(kind, enum_name).ok_or_else(|| SchemaError::MissingEnumName {
        entity: entity.to_string(),
        field: field.to_string(),
    })
}

fn non_empty(name: Option<String>) -> Option<String> {
    name.map(|n| n.trim().to_string()).filter(|n| !n.is_empty())
}
