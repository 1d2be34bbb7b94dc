//! SQL script import.
//!
//! Executes a whole dump script statement by statement. Splitting is a
//! plain `;` split, which is wrong for literals containing semicolons --
//! including dumps of data that happens to hold one. Such statements
//! arrive broken and fail at the server. Failures are collected per
//! statement and execution continues, so one broken statement does not
//! abort the rest of the script.

use crate::db;
use crate::error::AdminResult;
use crate::session::Session;
use crate::sql::ddl::build_drop_table;
use serde::{Deserialize, Serialize};
use sqlx::Executor;
use tracing::{info, warn};

/// Longest statement prefix echoed back in an error entry.
const ERROR_STATEMENT_PREVIEW: usize = 100;

/// Input for the import action.
#[derive(Debug, Clone, Deserialize)]
pub struct ImportInput {
    pub database: String,
    /// Full script text, statements separated by `;`.
    pub sql: String,
    /// Drop all existing tables in the database before running the script.
    #[serde(default)]
    pub drop_existing: bool,
}

/// One failed statement, with a truncated echo of its text.
#[derive(Debug, Clone, Serialize)]
pub struct ImportStatementError {
    pub statement: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImportOutput {
    /// Statements that ran without error.
    pub executed: usize,
    pub errors: Vec<ImportStatementError>,
    /// True only when every statement succeeded.
    pub success: bool,
}

/// Split a script into statements on `;`, dropping empty fragments and
/// fragments that are nothing but comment lines.
pub fn split_statements(script: &str) -> Vec<String> {
    script
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| !s.lines().all(|line| {
            let line = line.trim();
            line.is_empty() || line.starts_with("--")
        }))
        .map(str::to_string)
        .collect()
}

fn preview(statement: &str) -> String {
    if statement.chars().count() <= ERROR_STATEMENT_PREVIEW {
        return statement.to_string();
    }
    let truncated: String = statement.chars().take(ERROR_STATEMENT_PREVIEW).collect();
    format!("{}...", truncated)
}

/// Handler for the import action.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImportHandler;

impl ImportHandler {
    pub fn new() -> Self {
        Self
    }

    /// Run a script against one database, statement by statement.
    pub async fn run(&self, session: &Session, input: ImportInput) -> AdminResult<ImportOutput> {
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;

        let mut executed = 0usize;
        let mut errors = Vec::new();

        if input.drop_existing {
            // Dropping with the checks off lets tables go in any order
            // regardless of foreign keys between them.
            conn.execute("SET FOREIGN_KEY_CHECKS = 0").await.ok();
            let tables = db::list_tables(&mut conn, &input.database).await?;
            for table in &tables {
                let drop_sql = match build_drop_table(&table.name) {
                    Ok(sql) => sql.replace("DROP TABLE", "DROP TABLE IF EXISTS"),
                    Err(e) => {
                        errors.push(ImportStatementError {
                            statement: format!("DROP TABLE {}", table.name),
                            error: e.to_string(),
                        });
                        continue;
                    }
                };
                if let Err(e) = conn.execute(drop_sql.as_str()).await {
                    warn!(table = %table.name, error = %e, "Pre-import drop failed");
                    errors.push(ImportStatementError {
                        statement: preview(&drop_sql),
                        error: e.to_string(),
                    });
                }
            }
            conn.execute("SET FOREIGN_KEY_CHECKS = 1").await.ok();
        }

        for statement in split_statements(&input.sql) {
            match conn.execute(statement.as_str()).await {
                Ok(_) => executed += 1,
                Err(e) => {
                    warn!(error = %e, "Import statement failed");
                    errors.push(ImportStatementError {
                        statement: preview(&statement),
                        error: e.to_string(),
                    });
                }
            }
        }

        let success = errors.is_empty();
        info!(
            database = %input.database,
            executed = executed,
            failed = errors.len(),
            "Import finished"
        );
        Ok(ImportOutput {
            executed,
            errors,
            success,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_basic_statements() {
        let script = "CREATE TABLE t (id INT);\nINSERT INTO t VALUES (1);\n";
        let statements = split_statements(script);
        assert_eq!(
            statements,
            vec!["CREATE TABLE t (id INT)", "INSERT INTO t VALUES (1)"]
        );
    }

    #[test]
    fn test_split_skips_empty_and_comment_fragments() {
        let script = "-- dump header\n;;CREATE TABLE t (id INT);\n-- trailing note\n";
        let statements = split_statements(script);
        assert_eq!(statements, vec!["CREATE TABLE t (id INT)"]);
    }

    #[test]
    fn test_split_keeps_statement_with_leading_comment() {
        let script = "-- users\nCREATE TABLE u (id INT);";
        let statements = split_statements(script);
        assert_eq!(statements, vec!["-- users\nCREATE TABLE u (id INT)"]);
    }

    #[test]
    fn test_split_is_naive_about_literals() {
        // Known limitation: a semicolon inside a string literal splits too.
        let statements = split_statements("INSERT INTO t VALUES ('a;b')");
        assert_eq!(statements.len(), 2);
    }

    #[test]
    fn test_preview_truncates_long_statements() {
        let long = "x".repeat(500);
        let p = preview(&long);
        assert_eq!(p.chars().count(), ERROR_STATEMENT_PREVIEW + 3);
        assert!(p.ends_with("..."));

        assert_eq!(preview("short"), "short");
    }

    #[test]
    fn test_import_input_defaults() {
        let input: ImportInput =
            serde_json::from_str(r#"{"database": "app", "sql": "SELECT 1"}"#).unwrap();
        assert!(!input.drop_existing);
    }
}
