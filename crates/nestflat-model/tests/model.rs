use nestflat_model::{
    ElementKind, FieldId, FieldType, FieldValue, Identity, Locale, MigrationOptions, ModelError,
};
use serde_json::json;

#[test]
fn locale_is_trimmed_and_never_empty() {
    assert_eq!(Locale::new(" de ").unwrap().as_str(), "de");
    assert_eq!(
        Locale::new("  "),
        Err(ModelError::InvalidLocale("  ".to_string()))
    );
}

#[test]
fn blank_locales_do_not_deserialize() {
    let locale: Locale = serde_json::from_value(json!(" fr ")).unwrap();
    assert_eq!(locale.as_str(), "fr");
    assert_eq!(serde_json::to_value(&locale).unwrap(), json!("fr"));
    assert!(serde_json::from_value::<Locale>(json!("")).is_err());
    assert!(serde_json::from_value::<Vec<Locale>>(json!(["en", " "])).is_err());
}

#[test]
fn false_and_zero_are_values() {
    assert!(!FieldValue::scalar(false).is_empty());
    assert!(!FieldValue::scalar(0).is_empty());
    assert!(FieldValue::scalar("").is_empty());
    assert!(FieldValue::Scalar(serde_json::Value::Null).is_empty());
    assert!(FieldValue::relation(ElementKind::Entry, Vec::new()).is_empty());
    assert!(FieldValue::Nested(Vec::new()).is_empty());
}

#[test]
fn only_known_element_kinds_migrate() {
    assert!(ElementKind::Asset.is_migratable());
    assert!(!ElementKind::Other("products".into()).is_migratable());
}

#[test]
fn field_value_json_shape() {
    let value = FieldValue::relation(ElementKind::Category, [4, 9]);
    assert_eq!(
        serde_json::to_value(&value).unwrap(),
        json!({"type": "relation", "value": {"kind": "category", "ids": [4, 9]}})
    );
    let parsed: FieldValue =
        serde_json::from_value(json!({"type": "scalar", "value": true})).unwrap();
    assert_eq!(parsed, FieldValue::scalar(true));
}

#[test]
fn identity_and_field_type_json_shape() {
    let stored: Identity<FieldId> = Identity::Persisted(FieldId::new(7));
    assert_eq!(serde_json::to_value(stored).unwrap(), json!({"persisted": 7}));
    assert_eq!(
        serde_json::to_value(FieldType::leaf("PlainText")).unwrap(),
        json!({"kind": "leaf", "tag": "PlainText"})
    );
    assert_eq!(
        serde_json::to_value(FieldType::Hierarchical).unwrap(),
        json!({"kind": "hierarchical"})
    );
}

#[test]
fn default_options_delete_sources_without_cleanup() {
    let options = MigrationOptions::default();
    assert!(options.delete_source_records);
    assert!(!options.clean_unused_fields);
}
