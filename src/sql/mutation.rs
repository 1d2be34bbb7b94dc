//! Parameterized DML builders for single-row mutations.
//!
//! Every value travels as a bind; only validated, backtick-quoted
//! identifiers reach the SQL text. Empty-string cells are normalized to SQL
//! NULL before binding: the admin UI cannot distinguish "empty string" from
//! "no value entered", so empty string means NULL on write.

use crate::error::{AdminError, AdminResult};
use crate::models::SqlValue;
use crate::sql::escape::Ident;
use serde_json::{Map as JsonMap, Value as JsonValue};

/// A parameterized statement with its bind values in placeholder order.
#[derive(Debug, Clone)]
pub struct BoundStatement {
    pub sql: String,
    pub binds: Vec<SqlValue>,
}

/// Convert one request cell into a bind value, applying the
/// empty-string -> NULL normalization.
fn normalize_cell(value: &JsonValue) -> SqlValue {
    match SqlValue::from_json(value) {
        SqlValue::String(s) if s.is_empty() => SqlValue::Null,
        other => other,
    }
}

/// `INSERT INTO t (cols...) VALUES (?...)` from a column -> value map.
pub fn build_insert(table: &str, data: &JsonMap<String, JsonValue>) -> AdminResult<BoundStatement> {
    if data.is_empty() {
        return Err(AdminError::invalid_input("No columns to insert"));
    }
    let table = Ident::new(table)?.quoted();

    let mut columns = Vec::with_capacity(data.len());
    let mut binds = Vec::with_capacity(data.len());
    for (column, value) in data {
        columns.push(Ident::new(column.as_str())?.quoted());
        binds.push(normalize_cell(value));
    }
    let placeholders = vec!["?"; binds.len()].join(", ");

    Ok(BoundStatement {
        sql: format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            columns.join(", "),
            placeholders
        ),
        binds,
    })
}

/// `UPDATE t SET col = ?, ... WHERE pk = ?` from a column -> value map plus
/// the primary-key predicate. The key value binds last.
pub fn build_update(
    table: &str,
    data: &JsonMap<String, JsonValue>,
    pk_column: &str,
    pk_value: &JsonValue,
) -> AdminResult<BoundStatement> {
    if data.is_empty() {
        return Err(AdminError::invalid_input("No columns to update"));
    }
    let table = Ident::new(table)?.quoted();
    let pk_column = Ident::new(pk_column)?.quoted();

    let mut assignments = Vec::with_capacity(data.len());
    let mut binds = Vec::with_capacity(data.len() + 1);
    for (column, value) in data {
        assignments.push(format!("{} = ?", Ident::new(column.as_str())?.quoted()));
        binds.push(normalize_cell(value));
    }
    // The key predicate does not go through empty-string normalization
    binds.push(SqlValue::from_json(pk_value));

    Ok(BoundStatement {
        sql: format!(
            "UPDATE {} SET {} WHERE {} = ?",
            table,
            assignments.join(", "),
            pk_column
        ),
        binds,
    })
}

/// `DELETE FROM t WHERE pk = ?`. Deleting zero rows is not an error;
/// callers report the affected-row count as-is.
pub fn build_delete(table: &str, pk_column: &str, pk_value: &JsonValue) -> AdminResult<BoundStatement> {
    let table = Ident::new(table)?.quoted();
    let pk_column = Ident::new(pk_column)?.quoted();
    Ok(BoundStatement {
        sql: format!("DELETE FROM {} WHERE {} = ?", table, pk_column),
        binds: vec![SqlValue::from_json(pk_value)],
    })
}

/// `SELECT * FROM t WHERE pk = ? LIMIT 1`. Zero rows here is an explicit
/// not-found error, unlike the zero-affected-rows delete case.
pub fn build_fetch_by_key(
    table: &str,
    pk_column: &str,
    pk_value: &JsonValue,
) -> AdminResult<BoundStatement> {
    let table = Ident::new(table)?.quoted();
    let pk_column = Ident::new(pk_column)?.quoted();
    Ok(BoundStatement {
        sql: format!("SELECT * FROM {} WHERE {} = ? LIMIT 1", table, pk_column),
        binds: vec![SqlValue::from_json(pk_value)],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn data(value: JsonValue) -> JsonMap<String, JsonValue> {
        value.as_object().cloned().unwrap_or_default()
    }

    #[test]
    fn test_insert_shape() {
        let stmt = build_insert("users", &data(json!({"age": 30, "name": "alice"}))).unwrap();
        assert_eq!(
            stmt.sql,
            "INSERT INTO `users` (`age`, `name`) VALUES (?, ?)"
        );
        assert_eq!(
            stmt.binds,
            vec![SqlValue::Int(30), SqlValue::String("alice".to_string())]
        );
    }

    #[test]
    fn test_insert_empty_string_becomes_null() {
        let stmt = build_insert("users", &data(json!({"name": ""}))).unwrap();
        assert_eq!(stmt.binds, vec![SqlValue::Null]);
    }

    #[test]
    fn test_insert_rejects_empty_map() {
        let err = build_insert("users", &JsonMap::new()).unwrap_err();
        assert!(matches!(err, AdminError::InvalidInput { .. }));
    }

    #[test]
    fn test_update_shape_and_key_binds_last() {
        let stmt = build_update(
            "users",
            &data(json!({"email": "", "name": "bob"})),
            "id",
            &json!(7),
        )
        .unwrap();
        assert_eq!(
            stmt.sql,
            "UPDATE `users` SET `email` = ?, `name` = ? WHERE `id` = ?"
        );
        assert_eq!(
            stmt.binds,
            vec![
                SqlValue::Null,
                SqlValue::String("bob".to_string()),
                SqlValue::Int(7)
            ]
        );
    }

    #[test]
    fn test_update_key_value_not_nulled() {
        // An empty-string key still matches rows keyed by the empty string
        let stmt = build_update("users", &data(json!({"name": "x"})), "code", &json!(""))
            .unwrap();
        assert_eq!(stmt.binds[1], SqlValue::String(String::new()));
    }

    #[test]
    fn test_delete_shape() {
        let stmt = build_delete("users", "id", &json!(3)).unwrap();
        assert_eq!(stmt.sql, "DELETE FROM `users` WHERE `id` = ?");
        assert_eq!(stmt.binds, vec![SqlValue::Int(3)]);
    }

    #[test]
    fn test_fetch_by_key_limits_to_one() {
        let stmt = build_fetch_by_key("users", "id", &json!(3)).unwrap();
        assert_eq!(stmt.sql, "SELECT * FROM `users` WHERE `id` = ? LIMIT 1");
    }

    #[test]
    fn test_identifiers_are_validated() {
        assert!(build_insert("bad`t", &data(json!({"a": 1}))).is_err());
        assert!(build_delete("users", "i`d", &json!(1)).is_err());
    }
}
