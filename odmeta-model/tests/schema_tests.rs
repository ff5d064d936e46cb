use odmeta_model::{
    EntitySchema, KeyFieldDoc, PropertyKind, PropertyType, SchemaDocument, SchemaError,
};
use pretty_assertions::assert_eq;

fn customers_doc() -> SchemaDocument {
    SchemaDocument::new("CustomersV3")
        .with_version("W/\"1\"")
        .with_logical_name("CustomerV3")
        .with_entity_set_name("CustomersV3Set")
        .with_collection_name("Customers")
        .with_key(KeyFieldDoc::new("dataAreaId", &PropertyType::String))
        .with_key(KeyFieldDoc::new("CustomerAccount", &PropertyType::String))
        .with_property("dataAreaId", &PropertyType::String)
        .with_property("CreditLimit", &PropertyType::Real)
        .with_property("Blocked", &PropertyType::enumeration("CustVendorBlocked"))
}

// ── PropertyType ─────────────────────────────────────────────────

#[test]
fn property_type_from_parts_plain_tags() {
    assert_eq!(
        PropertyType::from_parts(PropertyKind::Int64, None),
        Some(PropertyType::Int64)
    );
    assert_eq!(
        PropertyType::from_parts(PropertyKind::Boolean, Some("ignored")),
        Some(PropertyType::Boolean)
    );
}

#[test]
fn property_type_enum_requires_name() {
    assert_eq!(PropertyType::from_parts(PropertyKind::Enum, None), None);
    assert_eq!(PropertyType::from_parts(PropertyKind::Enum, Some("  ")), None);
    assert_eq!(
        PropertyType::from_parts(PropertyKind::Enum, Some("NoYes")),
        Some(PropertyType::Enum("NoYes".into()))
    );
}

#[test]
fn property_type_kind_and_display() {
    let ty = PropertyType::enumeration("NoYes");
    assert_eq!(ty.kind(), PropertyKind::Enum);
    assert_eq!(ty.enum_name(), Some("NoYes"));
    assert_eq!(ty.to_string(), "enum(NoYes)");
    assert_eq!(PropertyType::DateTime.to_string(), "date_time");
    assert_eq!(PropertyType::Int32.enum_name(), None);
}

#[test]
fn property_kind_serializes_snake_case() {
    let json = serde_json::to_string(&PropertyKind::DateTime).unwrap();
    assert_eq!(json, "\"date_time\"");
    let kind: PropertyKind = serde_json::from_str("\"int32\"").unwrap();
    assert_eq!(kind, PropertyKind::Int32);
}

// ── EntitySchema construction ────────────────────────────────────

#[test]
fn schema_keeps_names_and_version() {
    let schema = EntitySchema::from_document(customers_doc()).unwrap();
    assert_eq!(schema.canonical_name(), "CustomersV3");
    assert_eq!(schema.logical_name(), Some("CustomerV3"));
    assert_eq!(schema.entity_set_name(), Some("CustomersV3Set"));
    assert_eq!(schema.collection_name(), Some("Customers"));
    assert_eq!(schema.version(), "W/\"1\"");
}

#[test]
fn schema_key_fields_keep_document_order() {
    let schema = EntitySchema::from_document(customers_doc()).unwrap();
    let names: Vec<_> = schema.key_fields().iter().map(|k| k.name()).collect();
    assert_eq!(names, vec!["dataAreaId", "CustomerAccount"]);
    let ordinals: Vec<_> = schema.key_fields().iter().map(|k| k.ordinal()).collect();
    assert_eq!(ordinals, vec![0, 1]);
    assert!(schema.is_composite_key());
}

#[test]
fn schema_adds_key_fields_missing_from_properties() {
    let schema = EntitySchema::from_document(customers_doc()).unwrap();
    assert_eq!(
        schema.property_type("CustomerAccount"),
        Some(&PropertyType::String)
    );
    assert_eq!(schema.properties().len(), 4);
}

#[test]
fn schema_names_lists_canonical_first() {
    let schema = EntitySchema::from_document(customers_doc()).unwrap();
    let names: Vec<_> = schema.names().map(|(_, n)| n).collect();
    assert_eq!(
        names,
        vec!["CustomersV3", "CustomerV3", "CustomersV3Set", "Customers"]
    );
}

#[test]
fn schema_blank_aliases_are_dropped() {
    let doc = SchemaDocument::new("Vendors")
        .with_collection_name("   ")
        .with_key(KeyFieldDoc::new("VendorAccount", &PropertyType::String));
    let schema = EntitySchema::from_document(doc).unwrap();
    assert_eq!(schema.collection_name(), None);
    assert_eq!(schema.names().count(), 1);
}

#[test]
fn schema_optional_key_field() {
    let doc = SchemaDocument::new("Lines")
        .with_key(KeyFieldDoc::new("OrderId", &PropertyType::Int64))
        .with_key(KeyFieldDoc::new("LineNumber", &PropertyType::Real).optional());
    let schema = EntitySchema::from_document(doc).unwrap();
    assert!(schema.key_field("OrderId").unwrap().is_mandatory());
    assert!(!schema.key_field("LineNumber").unwrap().is_mandatory());
    assert!(!schema.is_key_field("Description"));
}

#[test]
fn schema_document_roundtrip() {
    let schema = EntitySchema::from_document(customers_doc()).unwrap();
    let rebuilt = EntitySchema::from_document(schema.to_document()).unwrap();
    assert_eq!(schema, rebuilt);
}

// ── Rejected documents ───────────────────────────────────────────

#[test]
fn schema_rejects_missing_name() {
    let doc = SchemaDocument::new("  ").with_key(KeyFieldDoc::new("Id", &PropertyType::Int32));
    assert_eq!(EntitySchema::from_document(doc), Err(SchemaError::MissingName));
}

#[test]
fn schema_rejects_no_keys() {
    let err = EntitySchema::from_document(SchemaDocument::new("Empty")).unwrap_err();
    assert_eq!(
        err,
        SchemaError::NoKeyFields {
            entity: "Empty".into()
        }
    );
}

#[test]
fn schema_rejects_duplicate_key_field() {
    let doc = SchemaDocument::new("Dup")
        .with_key(KeyFieldDoc::new("Id", &PropertyType::Int32))
        .with_key(KeyFieldDoc::new("Id", &PropertyType::Int32));
    assert!(matches!(
        EntitySchema::from_document(doc),
        Err(SchemaError::DuplicateKeyField { .. })
    ));
}

#[test]
fn schema_rejects_duplicate_property() {
    let doc = SchemaDocument::new("Dup")
        .with_key(KeyFieldDoc::new("Id", &PropertyType::Int32))
        .with_property("Name", &PropertyType::String)
        .with_property("Name", &PropertyType::String);
    assert!(matches!(
        EntitySchema::from_document(doc),
        Err(SchemaError::DuplicateProperty { .. })
    ));
}

#[test]
fn schema_rejects_key_type_conflict() {
    let doc = SchemaDocument::new("Conflict")
        .with_key(KeyFieldDoc::new("Id", &PropertyType::Int32))
        .with_property("Id", &PropertyType::String);
    let err = EntitySchema::from_document(doc).unwrap_err();
    assert_eq!(
        err.to_string(),
        "entity Conflict: key field Id is int32 but the property map says string"
    );
}

#[test]
fn schema_rejects_enum_without_name() {
    let json = r#"{
        "name": "Flags",
        "keys": [{"name": "Kind", "type": "enum"}]
    }"#;
    let doc = SchemaDocument::from_json(json).unwrap();
    assert_eq!(
        EntitySchema::from_document(doc),
        Err(SchemaError::MissingEnumName {
            entity: "Flags".into(),
            field: "Kind".into()
        })
    );
}

#[test]
fn schema_rejects_empty_field_name() {
    let doc = SchemaDocument::new("Blank").with_key(KeyFieldDoc::new(" ", &PropertyType::Int32));
    assert!(matches!(
        EntitySchema::from_document(doc),
        Err(SchemaError::EmptyFieldName { .. })
    ));
}

// ── JSON documents ───────────────────────────────────────────────

#[test]
fn document_from_json_defaults() {
    let json = r#"{
        "name": "ReleasedProducts",
        "public_entity_set_name": "ReleasedProductsV2",
        "keys": [
            {"name": "dataAreaId", "type": "string"},
            {"name": "ItemNumber", "type": "string", "mandatory": false}
        ]
    }"#;
    let doc = SchemaDocument::from_json(json).unwrap();
    assert_eq!(doc.version, "");
    assert_eq!(doc.entity_set_name.as_deref(), Some("ReleasedProductsV2"));
    assert!(doc.keys[0].mandatory);
    assert!(!doc.keys[1].mandatory);
    assert!(doc.properties.is_empty());
}

#[test]
fn document_from_json_enum_key() {
    let json = r#"{
        "name": "Flags",
        "keys": [{"name": "IsActive", "type": "enum", "enum_name": "NoYes"}]
    }"#;
    let schema = EntitySchema::from_document(SchemaDocument::from_json(json).unwrap()).unwrap();
    assert_eq!(
        schema.key_fields()[0].property_type(),
        &PropertyType::Enum("NoYes".into())
    );
}

#[test]
fn document_from_json_invalid() {
    let err = SchemaDocument::from_json("{\"name\": 5}").unwrap_err();
    assert!(matches!(err, SchemaError::InvalidDocument(_)));
}

#[test]
fn document_json_skips_absent_aliases() {
    let doc = SchemaDocument::new("Plain").with_key(KeyFieldDoc::new("Id", &PropertyType::Guid));
    let json = doc.to_json().unwrap();
    assert!(!json.contains("logical_name"));
    assert!(!json.contains("enum_name"));
    assert_eq!(SchemaDocument::from_json(&json).unwrap(), doc);
}
