//! Ad-hoc SQL execution.
//!
//! Runs one user-authored statement per request: normalized to a single
//! statement, classified by its leading keyword, and for SELECTs rewritten
//! so the LIMIT never exceeds the configured ceiling. Results come back in
//! one of two shapes so the front end can render either a grid or an
//! affected-rows summary.

use crate::db;
use crate::error::{AdminError, AdminResult};
use crate::models::RowLimitPolicy;
use crate::session::Session;
use crate::sql::limit::{StatementKind, prepare_adhoc_statement};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::info;

/// Input for the ad-hoc query action.
#[derive(Debug, Clone, Deserialize)]
pub struct AdhocQueryInput {
    /// Database to run against; omit for server-level statements like
    /// `SHOW DATABASES`.
    #[serde(default)]
    pub database: Option<String>,
    pub sql: String,
}

/// Result of one ad-hoc statement, tagged by shape.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum AdhocQueryOutput {
    /// Row-returning statement.
    #[serde(rename = "select")]
    #[serde(rename_all = "camelCase")]
    Select {
        data: Vec<serde_json::Map<String, JsonValue>>,
        row_count: usize,
        /// Rows in the materialized result. Equal to rowCount; the capped
        /// statement is what ran, so no fuller total exists.
        total_rows: usize,
        message: String,
    },
    /// Statement reporting affected rows instead of a result set.
    #[serde(rename = "non-select")]
    #[serde(rename_all = "camelCase")]
    NonSelect {
        affected_rows: u64,
        /// AUTO_INCREMENT id for INSERTs, 0 otherwise.
        insert_id: u64,
        message: String,
    },
}

fn non_select_message(kind: StatementKind, affected_rows: u64, insert_id: u64) -> String {
    match kind {
        StatementKind::Insert => format!(
            "{} row(s) inserted. Insert ID: {}",
            affected_rows, insert_id
        ),
        StatementKind::Update => format!("{} row(s) updated", affected_rows),
        StatementKind::Delete => format!("{} row(s) deleted", affected_rows),
        _ => "Query executed successfully".to_string(),
    }
}

/// Handler for ad-hoc SQL execution.
#[derive(Debug, Clone, Copy)]
pub struct QueryHandler {
    limits: RowLimitPolicy,
}

impl QueryHandler {
    pub fn new(limits: RowLimitPolicy) -> Self {
        Self { limits }
    }

    /// Execute one ad-hoc statement.
    ///
    /// Statements whose leading keyword is not SELECT run through the
    /// execute path even when they return rows (e.g. `SHOW TABLES` reports
    /// zero affected rows); that matches classification by keyword rather
    /// than by a SQL grammar.
    pub async fn execute(
        &self,
        session: &Session,
        input: AdhocQueryInput,
    ) -> AdminResult<AdhocQueryOutput> {
        let prepared = prepare_adhoc_statement(&input.sql, self.limits.max_select_rows)?;
        let mut conn = db::connect(&session.credentials, input.database.as_deref()).await?;

        if prepared.kind.is_select() {
            let rows = db::fetch_all(&mut conn, &prepared.sql, &[])
                .await
                .map_err(|e| AdminError::execution("Query execution failed", e))?;
            let data = db::rows_to_json(&rows);
            let row_count = data.len();

            info!(row_count = row_count, "Ad-hoc SELECT executed");
            return Ok(AdhocQueryOutput::Select {
                data,
                row_count,
                total_rows: row_count,
                message: format!("{} row(s) returned", row_count),
            });
        }

        let (affected_rows, insert_id) = db::execute(&mut conn, &prepared.sql, &[])
            .await
            .map_err(|e| AdminError::execution("Query execution failed", e))?;

        info!(
            affected_rows = affected_rows,
            "Ad-hoc statement executed"
        );
        Ok(AdhocQueryOutput::NonSelect {
            affected_rows,
            insert_id,
            message: non_select_message(prepared.kind, affected_rows, insert_id),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_output_shape() {
        let output = AdhocQueryOutput::Select {
            data: vec![],
            row_count: 0,
            total_rows: 0,
            message: "0 row(s) returned".to_string(),
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"type\":\"select\""));
        assert!(json.contains("\"rowCount\":0"));
        assert!(json.contains("\"totalRows\":0"));
    }

    #[test]
    fn test_non_select_output_shape() {
        let output = AdhocQueryOutput::NonSelect {
            affected_rows: 3,
            insert_id: 0,
            message: "3 row(s) updated".to_string(),
        };
        let json = serde_json::to_string(&output).unwrap();
        assert!(json.contains("\"type\":\"non-select\""));
        assert!(json.contains("\"affectedRows\":3"));
        assert!(json.contains("\"insertId\":0"));
    }

    #[test]
    fn test_non_select_messages_name_the_verb() {
        assert_eq!(
            non_select_message(StatementKind::Insert, 1, 7),
            "1 row(s) inserted. Insert ID: 7"
        );
        assert_eq!(
            non_select_message(StatementKind::Delete, 2, 0),
            "2 row(s) deleted"
        );
        assert_eq!(
            non_select_message(StatementKind::Other, 0, 0),
            "Query executed successfully"
        );
    }

    #[test]
    fn test_input_database_optional() {
        let input: AdhocQueryInput =
            serde_json::from_str(r#"{"sql": "SHOW DATABASES"}"#).unwrap();
        assert_eq!(input.database, None);
    }
}
