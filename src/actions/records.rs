//! Record browsing and single-row mutations.
//!
//! Implements the data-grid operations: a filtered/sorted/paginated page of
//! rows, fetching one record by key, and insert/update/delete. Every action
//! opens its own connection from the session credentials and drops it when
//! the response is built.

use crate::db;
use crate::error::{AdminError, AdminResult};
use crate::models::{FilterSpec, SortDirection, SqlValue};
use crate::session::Session;
use crate::sql::mutation::{build_delete, build_fetch_by_key, build_insert, build_update};
use crate::sql::select::build_record_page;
use serde::{Deserialize, Serialize};
use serde_json::{Map as JsonMap, Value as JsonValue};
use tracing::info;

/// Default page size for the records grid.
pub const DEFAULT_PAGE_ROWS: u64 = 30;

fn default_limit() -> u64 {
    DEFAULT_PAGE_ROWS
}

/// Input for listing one page of records.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordListInput {
    pub database: String,
    pub table: String,
    /// Column -> substring filters; empty values are ignored.
    #[serde(default)]
    pub filters: FilterSpec,
    /// Column to sort by; a missing or invalid name means natural order.
    #[serde(default)]
    pub sort_column: Option<String>,
    /// `ASC` or `DESC`; anything else sorts ascending.
    #[serde(default)]
    pub sort_direction: Option<String>,
    #[serde(default)]
    pub offset: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
}

/// One page of records plus the filtered total.
#[derive(Debug, Clone, Serialize)]
pub struct RecordListOutput {
    pub records: Vec<JsonMap<String, JsonValue>>,
    /// Count over the same filters, not just this page.
    pub total: u64,
    pub offset: u64,
    pub limit: u64,
}

/// Input for fetching a single record by key.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordGetInput {
    pub database: String,
    pub table: String,
    pub key_column: String,
    pub key_value: JsonValue,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecordGetOutput {
    pub record: JsonMap<String, JsonValue>,
}

/// Input for inserting one record.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordInsertInput {
    pub database: String,
    pub table: String,
    /// Column -> value map. Empty strings are stored as NULL.
    pub data: JsonMap<String, JsonValue>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordInsertOutput {
    pub affected_rows: u64,
    /// AUTO_INCREMENT id assigned by the server, 0 when none was generated.
    pub insert_id: u64,
}

/// Input for updating one record by key.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordUpdateInput {
    pub database: String,
    pub table: String,
    pub data: JsonMap<String, JsonValue>,
    pub key_column: String,
    pub key_value: JsonValue,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordMutationOutput {
    pub affected_rows: u64,
}

/// Input for deleting one record by key.
#[derive(Debug, Clone, Deserialize)]
pub struct RecordDeleteInput {
    pub database: String,
    pub table: String,
    pub key_column: String,
    pub key_value: JsonValue,
}

/// Handler for the record grid operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordHandler;

impl RecordHandler {
    pub fn new() -> Self {
        Self
    }

    /// One filtered, sorted page plus the total count over the same filters.
    ///
    /// The count and page statements run separately, so their failures carry
    /// distinct prefixes identifying the failing phase.
    pub async fn list(
        &self,
        session: &Session,
        input: RecordListInput,
    ) -> AdminResult<RecordListOutput> {
        let direction = input
            .sort_direction
            .as_deref()
            .map(SortDirection::parse)
            .unwrap_or_default();
        let page = build_record_page(
            &input.table,
            &input.filters,
            input.sort_column.as_deref(),
            direction,
            input.offset,
            input.limit,
        )?;

        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;

        let filter_binds: Vec<SqlValue> = page
            .filter_binds
            .iter()
            .cloned()
            .map(SqlValue::String)
            .collect();
        let total = db::fetch_count(&mut conn, &page.count_sql, &filter_binds)
            .await
            .map_err(|e| AdminError::execution("Counting records failed", e))?;

        let mut page_binds = filter_binds;
        page_binds.push(SqlValue::Int(page.limit as i64));
        page_binds.push(SqlValue::Int(page.offset as i64));
        let rows = db::fetch_all(&mut conn, &page.select_sql, &page_binds)
            .await
            .map_err(|e| AdminError::execution("Fetching records failed", e))?;

        info!(
            table = %input.table,
            rows = rows.len(),
            total = total,
            "Records page fetched"
        );

        Ok(RecordListOutput {
            records: db::rows_to_json(&rows),
            total,
            offset: page.offset,
            limit: page.limit,
        })
    }

    /// Fetch one record by its key column. Zero rows is an explicit
    /// not-found, unlike an empty list page.
    pub async fn get(
        &self,
        session: &Session,
        input: RecordGetInput,
    ) -> AdminResult<RecordGetOutput> {
        let stmt = build_fetch_by_key(&input.table, &input.key_column, &input.key_value)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        let rows = db::fetch_all(&mut conn, &stmt.sql, &stmt.binds)
            .await
            .map_err(|e| AdminError::execution("Fetching record failed", e))?;

        let row = rows.first().ok_or_else(|| {
            AdminError::not_found(format!(
                "No record in '{}' with {} = {}",
                input.table, input.key_column, input.key_value
            ))
        })?;
        use crate::db::RowToJson;
        Ok(RecordGetOutput {
            record: row.to_json_map(),
        })
    }

    pub async fn insert(
        &self,
        session: &Session,
        input: RecordInsertInput,
    ) -> AdminResult<RecordInsertOutput> {
        let stmt = build_insert(&input.table, &input.data)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        let (affected_rows, insert_id) = db::execute(&mut conn, &stmt.sql, &stmt.binds)
            .await
            .map_err(|e| AdminError::execution("Insert failed", e))?;

        info!(table = %input.table, insert_id = insert_id, "Record inserted");
        Ok(RecordInsertOutput {
            affected_rows,
            insert_id,
        })
    }

    pub async fn update(
        &self,
        session: &Session,
        input: RecordUpdateInput,
    ) -> AdminResult<RecordMutationOutput> {
        let stmt = build_update(
            &input.table,
            &input.data,
            &input.key_column,
            &input.key_value,
        )?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        let (affected_rows, _) = db::execute(&mut conn, &stmt.sql, &stmt.binds)
            .await
            .map_err(|e| AdminError::execution("Update failed", e))?;

        info!(
            table = %input.table,
            affected_rows = affected_rows,
            "Record updated"
        );
        Ok(RecordMutationOutput { affected_rows })
    }

    /// Delete one record by key. Zero affected rows is reported as-is, not
    /// as an error.
    pub async fn delete(
        &self,
        session: &Session,
        input: RecordDeleteInput,
    ) -> AdminResult<RecordMutationOutput> {
        let stmt = build_delete(&input.table, &input.key_column, &input.key_value)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        let (affected_rows, _) = db::execute(&mut conn, &stmt.sql, &stmt.binds)
            .await
            .map_err(|e| AdminError::execution("Delete failed", e))?;

        info!(
            table = %input.table,
            affected_rows = affected_rows,
            "Record deleted"
        );
        Ok(RecordMutationOutput { affected_rows })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_input_defaults() {
        let json = r#"{"database": "app", "table": "users"}"#;
        let input: RecordListInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.offset, 0);
        assert_eq!(input.limit, DEFAULT_PAGE_ROWS);
        assert!(input.filters.is_inactive());
        assert_eq!(input.sort_column, None);
    }

    #[test]
    fn test_list_input_with_filters() {
        let json = r#"{
            "database": "app",
            "table": "users",
            "filters": {"name": "li", "email": ""},
            "sort_column": "created_at",
            "sort_direction": "desc",
            "offset": 60,
            "limit": 30
        }"#;
        let input: RecordListInput = serde_json::from_str(json).unwrap();
        let active: Vec<_> = input.filters.active().collect();
        assert_eq!(active, vec![("name", "li")]);
        assert_eq!(
            input.sort_direction.as_deref().map(SortDirection::parse),
            Some(SortDirection::Desc)
        );
        assert_eq!(input.offset, 60);
    }

    #[test]
    fn test_insert_output_serialization() {
        let output = RecordInsertOutput {
            affected_rows: 1,
            insert_id: 42,
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"affectedRows\":1"));
        assert!(json.contains("\"insertId\":42"));
    }
}
