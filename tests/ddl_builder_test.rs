//! Integration tests for DDL composition: column editor statements, table
//! creation and renames.

use mysql_admin_server::sql::ddl::{
    ColumnSpec, build_add_column, build_create_table, build_drop_column, build_modify_column,
    build_rename_table,
};

fn spec_from_json(json: &str) -> ColumnSpec {
    serde_json::from_str(json).unwrap()
}

#[test]
fn test_add_column_full_definition() {
    let spec = spec_from_json(
        r#"{
            "name": "score",
            "type": "DECIMAL(10,2)",
            "nullable": false,
            "default_value": "0",
            "position": "after_name"
        }"#,
    );
    assert_eq!(
        build_add_column("players", &spec).unwrap(),
        "ALTER TABLE `players` ADD COLUMN `score` DECIMAL(10,2) NOT NULL DEFAULT '0' AFTER `name`"
    );
}

#[test]
fn test_add_column_first_position_and_keyword_default() {
    let spec = spec_from_json(
        r#"{
            "name": "created_at",
            "type": "TIMESTAMP",
            "default_value": "CURRENT_TIMESTAMP",
            "position": "first"
        }"#,
    );
    let sql = build_add_column("players", &spec).unwrap();
    assert!(sql.contains("DEFAULT CURRENT_TIMESTAMP"));
    assert!(sql.ends_with(" FIRST"));
    // Keyword defaults are spliced unquoted
    assert!(!sql.contains("'CURRENT_TIMESTAMP'"));
}

#[test]
fn test_modify_with_rename_emits_two_statements() {
    let spec = spec_from_json(r#"{"name": "total_score", "type": "BIGINT"}"#);
    let statements = build_modify_column("players", "score", &spec).unwrap();
    assert_eq!(
        statements,
        vec![
            "ALTER TABLE `players` MODIFY COLUMN `score` BIGINT".to_string(),
            "ALTER TABLE `players` RENAME COLUMN `score` TO `total_score`".to_string(),
        ]
    );
}

#[test]
fn test_modify_same_name_is_single_statement() {
    let spec = spec_from_json(r#"{"name": "score", "type": "BIGINT"}"#);
    let statements = build_modify_column("players", "score", &spec).unwrap();
    assert_eq!(statements.len(), 1);
}

#[test]
fn test_create_table_from_multiline_definition() {
    let definition = "id INT AUTO_INCREMENT PRIMARY KEY,\nprice DECIMAL(10,2),\nname VARCHAR(100) NOT NULL";
    let sql = build_create_table("products", definition, "InnoDB").unwrap();
    assert_eq!(
        sql,
        "CREATE TABLE `products` (id INT AUTO_INCREMENT PRIMARY KEY, price DECIMAL(10,2), name VARCHAR(100) NOT NULL) ENGINE=InnoDB"
    );
}

#[test]
fn test_create_table_rejects_injection_attempts() {
    assert!(build_create_table("products; DROP TABLE x", "id INT", "InnoDB").is_err());
    assert!(build_create_table("products", "id INT; DROP TABLE x", "InnoDB").is_err());
    assert!(build_create_table("products", "id INT", "InnoDB; --").is_err());
}

#[test]
fn test_rename_table_requires_strict_names() {
    assert_eq!(
        build_rename_table("products", "items").unwrap(),
        "RENAME TABLE `products` TO `items`"
    );
    assert!(build_rename_table("products", "new items").is_err());
    assert!(build_rename_table("products", "items`x").is_err());
}

#[test]
fn test_drop_column_statement() {
    assert_eq!(
        build_drop_column("players", "score").unwrap(),
        "ALTER TABLE `players` DROP COLUMN `score`"
    );
}

#[test]
fn test_default_value_with_quote_is_escaped() {
    let spec = spec_from_json(
        r#"{"name": "label", "type": "VARCHAR(20)", "default_value": "n/a's"}"#,
    );
    let sql = build_add_column("t", &spec).unwrap();
    assert!(sql.contains(r"DEFAULT 'n/a\'s'"));
}
