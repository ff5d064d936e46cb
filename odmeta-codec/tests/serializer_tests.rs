use odmeta_codec::{
    key_segment, serialize_key, validate_key, KeyFormat, SerializationError,
};
use odmeta_model::{EntitySchema, KeyFieldDoc, PropertyType, SchemaDocument};
use pretty_assertions::assert_eq;
use serde_json::{json, Map, Value};

fn object(value: Value) -> Map<String, Value> {
    value.as_object().cloned().unwrap()
}

fn ledger_schema() -> EntitySchema {
    let doc = SchemaDocument::new("LedgerEntries")
        .with_key(KeyFieldDoc::new("CompanyId", &PropertyType::String))
        .with_key(KeyFieldDoc::new("RecordId", &PropertyType::Int64))
        .with_key(KeyFieldDoc::new("EffectiveDate", &PropertyType::Date))
        .with_key(KeyFieldDoc::new("Priority", &PropertyType::Int32))
        .with_key(KeyFieldDoc::new(
            "IsActive",
            &PropertyType::enumeration("NoYes"),
        ));
    EntitySchema::from_document(doc).unwrap()
}

fn single_key_schema() -> EntitySchema {
    let doc = SchemaDocument::new("Workers")
        .with_key(KeyFieldDoc::new("PersonnelNumber", &PropertyType::String));
    EntitySchema::from_document(doc).unwrap()
}

// ── Composite keys ───────────────────────────────────────────────

#[test]
fn composite_mixed_type_key() {
    let key = validate_key(
        &ledger_schema(),
        &object(json!({
            "IsActive": "Yes",
            "CompanyId": "001",
            "Priority": 1,
            "RecordId": 123456789012345i64,
            "EffectiveDate": "2023-12-25"
        })),
    )
    .unwrap();

    assert_eq!(
        serialize_key(&key, KeyFormat::Named).unwrap(),
        "CompanyId='001',RecordId=123456789012345,EffectiveDate=2023-12-25,Priority=1,IsActive=Yes"
    );
}

#[test]
fn composite_key_ignores_bare_single_format() {
    let key = validate_key(
        &ledger_schema(),
        &object(json!({
            "CompanyId": "usmf",
            "RecordId": 5,
            "EffectiveDate": "2024-02-29",
            "Priority": -3,
            "IsActive": "No"
        })),
    )
    .unwrap();

    assert_eq!(
        serialize_key(&key, KeyFormat::BareSingle).unwrap(),
        serialize_key(&key, KeyFormat::Named).unwrap()
    );
}

#[test]
fn composite_order_is_independent_of_input_order() {
    let forward = object(json!({
        "CompanyId": "A",
        "RecordId": 1,
        "EffectiveDate": "2020-01-01",
        "Priority": 2,
        "IsActive": "Yes"
    }));
    let mut reversed = Map::new();
    for (k, v) in forward.iter().rev() {
        reversed.insert(k.clone(), v.clone());
    }

    let a = validate_key(&ledger_schema(), &forward).unwrap();
    let b = validate_key(&ledger_schema(), &reversed).unwrap();
    assert_eq!(
        serialize_key(&a, KeyFormat::Named).unwrap(),
        serialize_key(&b, KeyFormat::Named).unwrap()
    );
}

// ── Single keys ──────────────────────────────────────────────────

#[test]
fn single_key_named_and_bare() {
    let key = validate_key(
        &single_key_schema(),
        &object(json!({"PersonnelNumber": "000 123"})),
    )
    .unwrap();

    assert_eq!(
        serialize_key(&key, KeyFormat::Named).unwrap(),
        "PersonnelNumber='000%20123'"
    );
    assert_eq!(
        serialize_key(&key, KeyFormat::BareSingle).unwrap(),
        "'000%20123'"
    );
}

#[test]
fn key_format_default_is_named() {
    assert_eq!(KeyFormat::default(), KeyFormat::Named);
}

#[test]
fn entity_key_segment() {
    let key = validate_key(
        &single_key_schema(),
        &object(json!({"PersonnelNumber": "42"})),
    )
    .unwrap();

    assert_eq!(
        key_segment("Workers", &key, KeyFormat::BareSingle).unwrap(),
        "Workers('42')"
    );
    assert_eq!(
        key_segment("Workers", &key, KeyFormat::Named).unwrap(),
        "Workers(PersonnelNumber='42')"
    );
}

#[test]
fn empty_key_is_a_serialization_error() {
    let doc = SchemaDocument::new("Optional")
        .with_key(KeyFieldDoc::new("Id", &PropertyType::Int32).optional());
    let schema = EntitySchema::from_document(doc).unwrap();
    let key = validate_key(&schema, &Map::new()).unwrap();

    assert_eq!(
        serialize_key(&key, KeyFormat::Named),
        Err(SerializationError::EmptyKey {
            entity: "Optional".into()
        })
    );
}
