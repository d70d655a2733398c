use chrono::{NaiveDate, NaiveDateTime};
use roost_core::{
    BaseModel, Entity, EntityType, FieldValue, ModelError, Store, StoreConfig, StoreError, User,
};
use serde_json::{json, Map, Value};
use std::collections::HashSet;
use std::thread::sleep;
use std::time::Duration;
use tempfile::TempDir;

fn temp_store() -> (TempDir, Store) {
    let dir = tempfile::tempdir().unwrap();
    let store = Store::new(StoreConfig::new(dir.path().join("file.json")));
    (dir, store)
}

fn fixed_timestamp() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2026, 2, 13)
        .unwrap()
        .and_hms_micro_opt(10, 30, 5, 123_456)
        .unwrap()
}

fn object(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

#[test]
fn fresh_records_get_unique_ids() {
    let (_dir, mut store) = temp_store();
    let ids = (0..50)
        .map(|_| store.create::<BaseModel>())
        .collect::<HashSet<_>>();
    assert_eq!(ids.len(), 50);
    assert_eq!(store.len(), 50);
}

#[test]
fn fresh_record_is_registered_in_store() {
    let (_dir, mut store) = temp_store();
    let key = store.create::<User>();

    let user = store.get::<User>(&key).unwrap();
    assert!(store.all().contains_key(&format!("User.{}", user.id())));
    assert_eq!(user.record().created_at, user.record().updated_at);
}

#[test]
fn later_record_has_later_timestamps() {
    let (_dir, mut store) = temp_store();
    let first = store.create::<BaseModel>();
    sleep(Duration::from_millis(50));
    let second = store.create::<BaseModel>();

    let first = store.get::<BaseModel>(&first).unwrap().record().clone();
    let second = store.get::<BaseModel>(&second).unwrap().record().clone();
    assert!(first.created_at < second.created_at);
    assert!(first.updated_at < second.updated_at);
}

#[test]
fn persist_strictly_increases_updated_at() {
    let (_dir, mut store) = temp_store();
    let key = store.create::<BaseModel>();
    sleep(Duration::from_millis(50));

    let initial = store.get::<BaseModel>(&key).unwrap().record().updated_at;
    store.persist(&key).unwrap();
    let after_first = store.get::<BaseModel>(&key).unwrap().record().updated_at;
    assert!(initial < after_first);

    sleep(Duration::from_millis(50));
    store.persist(&key).unwrap();
    let after_second = store.get::<BaseModel>(&key).unwrap().record();
    assert!(after_first < after_second.updated_at);
    assert!(after_second.updated_at >= after_second.created_at);
}

#[test]
fn to_dict_renders_exact_shape() {
    let (_dir, mut store) = temp_store();
    let key = store.create::<BaseModel>();
    let timestamp = fixed_timestamp();

    let model = store.get_mut::<BaseModel>(&key).unwrap();
    model.record_mut().id = "123456".to_string();
    model.record_mut().created_at = timestamp;
    model.record_mut().updated_at = timestamp;

    let expected = object(json!({
        "id": "123456",
        "__class__": "BaseModel",
        "createdAt": "2026-02-13T10:30:05.123456",
        "updatedAt": "2026-02-13T10:30:05.123456",
    }));
    assert_eq!(model.to_dict(), expected);
}

#[test]
fn to_dict_includes_added_attributes() {
    let (_dir, mut store) = temp_store();
    let key = store.create::<BaseModel>();
    let model = store.get_mut::<BaseModel>(&key).unwrap();
    model.record_mut().set_attr("name", "Holberton").unwrap();
    model.record_mut().set_attr("my_number", 98).unwrap();

    let dict = model.to_dict();
    assert_eq!(dict["name"], json!("Holberton"));
    assert_eq!(dict["my_number"], json!(98));
    assert!(dict["createdAt"].is_string());
    assert!(dict["updatedAt"].is_string());
}

#[test]
fn to_dict_differs_from_live_fields() {
    let (_dir, mut store) = temp_store();
    let key = store.create::<BaseModel>();
    let model = store.get::<BaseModel>(&key).unwrap();

    let live = model.fields();
    let dict = model.to_dict();
    assert_eq!(
        live.iter().find(|(name, _)| name == "createdAt").map(|(_, value)| value),
        Some(&FieldValue::Timestamp(model.record().created_at))
    );
    assert!(!live.iter().any(|(name, _)| name == "__class__"));
    assert_ne!(dict.len(), live.len());
}

#[test]
fn to_dict_returns_fresh_mapping() {
    let (_dir, mut store) = temp_store();
    let key = store.create::<BaseModel>();
    let model = store.get::<BaseModel>(&key).unwrap();

    let mut dict = model.to_dict();
    dict.insert("id".to_string(), json!("tampered"));
    assert_ne!(model.id(), "tampered");
    assert_ne!(model.to_dict(), dict);
}

#[test]
fn to_dict_and_save_reject_arguments() {
    let (dir, mut store) = temp_store();
    let key = store.create::<BaseModel>();
    let before = store.get::<BaseModel>(&key).unwrap().record().updated_at;

    let err = store.invoke(&key, "to_dict", &[Value::Null]).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Model(ModelError::InvalidArgument { .. })
    ));

    let err = store.invoke(&key, "save", &[Value::Null]).unwrap_err();
    assert!(matches!(
        err,
        StoreError::Model(ModelError::InvalidArgument { .. })
    ));
    assert_eq!(
        store.get::<BaseModel>(&key).unwrap().record().updated_at,
        before
    );
    assert!(!dir.path().join("file.json").exists());
}

#[test]
fn save_by_name_persists_entity() {
    let (dir, mut store) = temp_store();
    let key = store.create::<BaseModel>();

    assert_eq!(store.invoke(&key, "save", &[]).unwrap(), None);
    let text = std::fs::read_to_string(dir.path().join("file.json")).unwrap();
    assert!(text.contains(&key));
}

#[test]
fn reconstruct_adopts_id_and_timestamps() {
    let timestamp = fixed_timestamp();
    let iso = timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();

    let model = BaseModel::from_dict(&object(json!({
        "id": "345",
        "createdAt": iso,
        "updatedAt": iso,
    })))
    .unwrap();
    assert_eq!(model.id(), "345");
    assert_eq!(model.record().created_at, timestamp);
    assert_eq!(model.record().updated_at, timestamp);
}

#[test]
fn reconstruct_does_not_register() {
    let (_dir, store) = temp_store();
    let model = User::from_dict(&object(json!({
        "id": "345",
        "createdAt": "2026-02-13T10:30:05.123456",
        "updatedAt": "2026-02-13T10:30:05.123456",
    })))
    .unwrap();
    assert!(!store.contains_key(&model.storage_key()));
    assert!(store.is_empty());
}

#[test]
fn reconstruct_with_null_timestamps_fails() {
    let err = BaseModel::from_dict(&object(json!({
        "id": null,
        "createdAt": null,
        "updatedAt": null,
    })))
    .unwrap_err();
    assert!(matches!(
        err,
        ModelError::InvalidTimestamp {
            field: "createdAt",
            ..
        }
    ));
}

#[test]
fn reconstruct_with_missing_timestamp_fails() {
    let err = BaseModel::from_dict(&object(json!({
        "id": "345",
        "createdAt": "2026-02-13T10:30:05",
    })))
    .unwrap_err();
    assert!(matches!(
        err,
        ModelError::InvalidTimestamp {
            field: "updatedAt",
            ..
        }
    ));
}

#[test]
fn positional_arguments_are_ignored() {
    let (_dir, mut store) = temp_store();
    let key = store.create_with::<BaseModel>(&[Value::Null]);
    let model = store.get::<BaseModel>(&key).unwrap();
    assert!(model.record().attributes().is_empty());
    assert!(!model
        .fields()
        .iter()
        .any(|(_, value)| *value == FieldValue::Json(Value::Null)));

    let timestamp = fixed_timestamp();
    let iso = timestamp.format("%Y-%m-%dT%H:%M:%S%.6f").to_string();
    let restored = BaseModel::restore(
        &[json!("12")],
        &object(json!({ "id": "345", "createdAt": iso, "updatedAt": iso })),
    )
    .unwrap();
    assert_eq!(restored.id(), "345");
    assert_eq!(restored.record().created_at, timestamp);
}

#[test]
fn display_uses_native_timestamps() {
    let (_dir, mut store) = temp_store();
    let key = store.create::<User>();
    let timestamp = fixed_timestamp();

    let user = store.get_mut::<User>(&key).unwrap();
    user.record_mut().id = "123456".to_string();
    user.record_mut().created_at = timestamp;
    user.record_mut().updated_at = timestamp;

    let text = user.to_string();
    assert!(text.contains("[User] (123456)"), "{text}");
    assert!(text.contains("'id': '123456'"), "{text}");
    assert!(text.contains(&format!("'createdAt': {timestamp:?}")), "{text}");
    assert!(text.contains(&format!("'updatedAt': {timestamp:?}")), "{text}");

    let dyn_text = store.get_dyn(&key).unwrap().to_string();
    assert_eq!(dyn_text, text);
}
