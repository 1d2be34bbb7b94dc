//! Database access layer.
//!
//! Per-request connections, value decoding for tables of unknown schema,
//! and MySQL schema reflection.

pub mod conn;
pub mod schema;
pub mod value;

pub use conn::{bind_value, connect, execute, fetch_all, fetch_count, rows_to_json};
pub use schema::{
    SYSTEM_DATABASES, describe_columns, describe_table, is_system_database, list_databases,
    list_tables, show_create_table, table_exists,
};
pub use value::{
    RowToJson, TypeCategory, categorize_type, column_categories, decode_column,
    get_optional_string, get_string,
};
