//! Schema reflection against MySQL's introspection surface.
//!
//! Descriptors are built from `SHOW` statements and information_schema on
//! every request. This module is written against MySQL specifically and is
//! not portable to other dialects.

use crate::db::value::{get_optional_string, get_string};
use crate::error::{AdminError, AdminResult};
use crate::models::{ColumnDescriptor, ForeignKeyInfo, KeyRole, TableDescriptor, TableKind};
use crate::sql::escape::Ident;
use sqlx::mysql::MySqlConnection;
use sqlx::{Executor, Row};
use std::collections::HashMap;

/// Schemas owned by the server itself; never exported, never droppable.
pub const SYSTEM_DATABASES: [&str; 4] =
    ["information_schema", "performance_schema", "mysql", "sys"];

/// True for schemas the admin tool must leave alone.
pub fn is_system_database(name: &str) -> bool {
    SYSTEM_DATABASES
        .iter()
        .any(|sys| name.eq_ignore_ascii_case(sys))
}

mod queries {
    /// Tables and views of one schema with their storage sizes.
    pub const LIST_TABLES: &str = "\
        SELECT TABLE_NAME, TABLE_TYPE, COALESCE(DATA_LENGTH, 0) + COALESCE(INDEX_LENGTH, 0) \
        FROM information_schema.TABLES \
        WHERE TABLE_SCHEMA = ? \
        ORDER BY TABLE_NAME";

    /// Existence check against both tables and views.
    pub const TABLE_EXISTS: &str = "\
        SELECT COUNT(*) \
        FROM information_schema.TABLES \
        WHERE TABLE_SCHEMA = ? AND TABLE_NAME = ?";

    /// Foreign keys of one table, with their referential rules.
    pub const FOREIGN_KEYS: &str = "\
        SELECT k.COLUMN_NAME, k.REFERENCED_TABLE_NAME, k.REFERENCED_COLUMN_NAME, \
               k.CONSTRAINT_NAME, r.UPDATE_RULE, r.DELETE_RULE \
        FROM information_schema.KEY_COLUMN_USAGE k \
        JOIN information_schema.REFERENTIAL_CONSTRAINTS r \
          ON k.CONSTRAINT_NAME = r.CONSTRAINT_NAME \
         AND k.CONSTRAINT_SCHEMA = r.CONSTRAINT_SCHEMA \
        WHERE k.TABLE_SCHEMA = ? AND k.TABLE_NAME = ? \
          AND k.REFERENCED_TABLE_NAME IS NOT NULL";
}

/// `SHOW DATABASES`, system schemas included (callers filter as needed).
pub async fn list_databases(conn: &mut MySqlConnection) -> AdminResult<Vec<String>> {
    let rows = conn
        .fetch_all("SHOW DATABASES")
        .await
        .map_err(|e| AdminError::execution("Listing databases failed", e))?;
    Ok(rows.iter().map(|row| get_string(row, 0)).collect())
}

/// Tables and views of one database, with kind and size.
pub async fn list_tables(
    conn: &mut MySqlConnection,
    database: &str,
) -> AdminResult<Vec<TableDescriptor>> {
    let rows = sqlx::query(queries::LIST_TABLES)
        .bind(database)
        .fetch_all(conn)
        .await
        .map_err(|e| {
            AdminError::execution(format!("Listing tables in '{}' failed", database), e)
        })?;

    Ok(rows
        .iter()
        .map(|row| {
            let name = get_string(row, 0);
            let kind = TableKind::parse(&get_string(row, 1));
            let size: u64 = row
                .try_get::<i64, _>(2)
                .map(|v| v.max(0) as u64)
                .unwrap_or(0);
            TableDescriptor::new(name, kind).with_size_bytes(size)
        })
        .collect())
}

/// Whether a table or view of this name exists in the database.
pub async fn table_exists(
    conn: &mut MySqlConnection,
    database: &str,
    table: &str,
) -> AdminResult<bool> {
    let count: i64 = sqlx::query_scalar(queries::TABLE_EXISTS)
        .bind(database)
        .bind(table)
        .fetch_one(conn)
        .await
        .map_err(|e| AdminError::execution("Table existence check failed", e))?;
    Ok(count > 0)
}

/// Reflect one table's columns, including foreign-key metadata.
pub async fn describe_columns(
    conn: &mut MySqlConnection,
    database: &str,
    table: &str,
) -> AdminResult<Vec<ColumnDescriptor>> {
    let mut foreign_keys = fetch_foreign_keys(conn, database, table).await?;

    let show_sql = format!("SHOW COLUMNS FROM {}", Ident::new(table)?.quoted());
    let rows = conn
        .fetch_all(show_sql.as_str())
        .await
        .map_err(|e| AdminError::execution(format!("Describing table '{}' failed", table), e))?;

    Ok(rows
        .iter()
        .map(|row| {
            // SHOW COLUMNS: Field, Type, Null, Key, Default, Extra
            let name = get_string(row, 0);
            let mut column = ColumnDescriptor::new(name.clone(), get_string(row, 1))
                .with_nullable(get_string(row, 2).eq_ignore_ascii_case("YES"))
                .with_key_role(KeyRole::parse(&get_string(row, 3)))
                .with_extra(get_string(row, 5));
            if let Some(default) = get_optional_string(row, 4) {
                column = column.with_default(default);
            }
            if let Some(fk) = foreign_keys.remove(&name) {
                column = column.with_foreign_key(fk);
            }
            column
        })
        .collect())
}

/// Foreign keys of one table, keyed by column name.
async fn fetch_foreign_keys(
    conn: &mut MySqlConnection,
    database: &str,
    table: &str,
) -> AdminResult<HashMap<String, ForeignKeyInfo>> {
    let rows = sqlx::query(queries::FOREIGN_KEYS)
        .bind(database)
        .bind(table)
        .fetch_all(conn)
        .await
        .map_err(|e| AdminError::execution("Foreign-key lookup failed", e))?;

    Ok(rows
        .iter()
        .map(|row| {
            (
                get_string(row, 0),
                ForeignKeyInfo {
                    referenced_table: get_string(row, 1),
                    referenced_column: get_string(row, 2),
                    constraint_name: get_string(row, 3),
                    update_rule: get_string(row, 4),
                    delete_rule: get_string(row, 5),
                },
            )
        })
        .collect())
}

/// Full descriptor for one table: kind, size, columns, primary key.
/// Views never report a primary key.
pub async fn describe_table(
    conn: &mut MySqlConnection,
    database: &str,
    table: &str,
) -> AdminResult<TableDescriptor> {
    let tables = list_tables(conn, database).await?;
    let descriptor = tables
        .into_iter()
        .find(|t| t.name == table)
        .ok_or_else(|| AdminError::not_found(format!("Table '{}' does not exist", table)))?;
    let columns = describe_columns(conn, database, table).await?;
    Ok(descriptor.with_columns(columns))
}

/// The `SHOW CREATE TABLE` DDL for one table.
pub async fn show_create_table(conn: &mut MySqlConnection, table: &str) -> AdminResult<String> {
    let sql = format!("SHOW CREATE TABLE {}", Ident::new(table)?.quoted());
    let row = conn
        .fetch_one(sql.as_str())
        .await
        .map_err(|e| AdminError::execution(format!("SHOW CREATE TABLE '{}' failed", table), e))?;
    // Column 1 holds the DDL for both tables and views
    Ok(get_string(&row, 1))
}
