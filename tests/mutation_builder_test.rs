//! Integration tests for the single-row DML builders.

use mysql_admin_server::models::SqlValue;
use mysql_admin_server::sql::{build_delete, build_fetch_by_key, build_insert, build_update};
use serde_json::json;

fn data(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
    value.as_object().cloned().unwrap_or_default()
}

#[test]
fn test_insert_binds_values_in_column_order() {
    let stmt = build_insert(
        "users",
        &data(json!({"name": "alice", "age": 30, "note": null})),
    )
    .unwrap();
    assert_eq!(
        stmt.sql,
        "INSERT INTO `users` (`name`, `age`, `note`) VALUES (?, ?, ?)"
    );
    assert_eq!(
        stmt.binds,
        vec![
            SqlValue::String("alice".to_string()),
            SqlValue::Int(30),
            SqlValue::Null,
        ]
    );
}

#[test]
fn test_empty_strings_are_stored_as_null() {
    let stmt = build_insert("users", &data(json!({"email": ""}))).unwrap();
    assert_eq!(stmt.binds, vec![SqlValue::Null]);

    let stmt = build_update("users", &data(json!({"email": ""})), "id", &json!(1)).unwrap();
    assert_eq!(stmt.binds[0], SqlValue::Null);
}

#[test]
fn test_update_key_predicate_is_exact_and_binds_last() {
    let stmt = build_update(
        "users",
        &data(json!({"name": "bob"})),
        "id",
        &json!(7),
    )
    .unwrap();
    assert_eq!(stmt.sql, "UPDATE `users` SET `name` = ? WHERE `id` = ?");
    assert_eq!(stmt.binds.last(), Some(&SqlValue::Int(7)));

    // The key value is not empty-string normalized
    let stmt = build_update("users", &data(json!({"name": "x"})), "code", &json!("")).unwrap();
    assert_eq!(stmt.binds.last(), Some(&SqlValue::String(String::new())));
}

#[test]
fn test_structured_json_cells_bind_as_text() {
    let stmt = build_insert("events", &data(json!({"payload": {"k": [1, 2]}}))).unwrap();
    assert_eq!(
        stmt.binds,
        vec![SqlValue::String(r#"{"k":[1,2]}"#.to_string())]
    );
}

#[test]
fn test_delete_and_fetch_shapes() {
    let stmt = build_delete("users", "id", &json!(5)).unwrap();
    assert_eq!(stmt.sql, "DELETE FROM `users` WHERE `id` = ?");

    let stmt = build_fetch_by_key("users", "id", &json!(5)).unwrap();
    assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `id` = ? LIMIT 1");
}

#[test]
fn test_builders_reject_invalid_identifiers_and_empty_maps() {
    assert!(build_insert("users", &serde_json::Map::new()).is_err());
    assert!(build_update("users", &serde_json::Map::new(), "id", &json!(1)).is_err());
    assert!(build_insert("u`sers", &data(json!({"a": 1}))).is_err());
    assert!(build_insert("users", &data(json!({"a`b": 1}))).is_err());
    assert!(build_delete("users", "id`", &json!(1)).is_err());
}
