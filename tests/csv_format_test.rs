//! Integration tests for CSV cell rendering and field escaping.

use mysql_admin_server::actions::csv::{UTF8_BOM, escape_csv_field, format_csv_cell};
use mysql_admin_server::db::TypeCategory;
use serde_json::json;

#[test]
fn test_plain_fields_pass_through() {
    assert_eq!(escape_csv_field("alice"), "alice");
    assert_eq!(escape_csv_field("42"), "42");
}

#[test]
fn test_fields_with_separators_are_quoted() {
    assert_eq!(escape_csv_field("Berlin, DE"), "\"Berlin, DE\"");
    assert_eq!(escape_csv_field("multi\nline"), "\"multi\nline\"");
    assert_eq!(escape_csv_field("cr\rhere"), "\"cr\rhere\"");
}

#[test]
fn test_quotes_are_doubled() {
    assert_eq!(
        escape_csv_field(r#"she said "hi""#),
        r#""she said ""hi""""#
    );
}

#[test]
fn test_null_cells_render_as_null_literal() {
    assert_eq!(format_csv_cell(&json!(null), TypeCategory::Text), "NULL");
    assert_eq!(format_csv_cell(&json!(null), TypeCategory::Integer), "NULL");
    assert_eq!(format_csv_cell(&json!(null), TypeCategory::Binary), "NULL");
}

#[test]
fn test_booleans_render_as_one_and_zero() {
    assert_eq!(format_csv_cell(&json!(true), TypeCategory::Boolean), "1");
    assert_eq!(format_csv_cell(&json!(false), TypeCategory::Boolean), "0");
}

#[test]
fn test_binary_cells_render_resource_placeholder() {
    assert_eq!(
        format_csv_cell(&json!("AAECAw=="), TypeCategory::Binary),
        "[resource]"
    );
}

#[test]
fn test_numbers_and_strings_render_verbatim() {
    assert_eq!(format_csv_cell(&json!(3.5), TypeCategory::Float), "3.5");
    assert_eq!(format_csv_cell(&json!(-7), TypeCategory::Integer), "-7");
    assert_eq!(
        format_csv_cell(&json!("plain text"), TypeCategory::Text),
        "plain text"
    );
}

#[test]
fn test_structured_values_render_as_json_text() {
    assert_eq!(
        format_csv_cell(&json!({"a": [1, 2]}), TypeCategory::Json),
        r#"{"a":[1,2]}"#
    );
}

#[test]
fn test_bom_is_the_utf8_byte_order_mark() {
    assert_eq!(UTF8_BOM.as_bytes(), [0xEF, 0xBB, 0xBF]);
}
