//! Column listing and structure editing.
//!
//! Lists one table's reflected columns and applies the column editor's
//! add/modify/drop operations. DDL statements are composed, never
//! parameterized; each step's failure carries a prefix naming the operation
//! so a partial modify-plus-rename is attributable.

use crate::db;
use crate::error::{AdminError, AdminResult};
use crate::models::ColumnDescriptor;
use crate::session::Session;
use crate::sql::ddl::{ColumnSpec, build_add_column, build_drop_column, build_modify_column};
use serde::{Deserialize, Serialize};
use sqlx::Executor;
use tracing::info;

/// Input for listing a table's columns.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnListInput {
    pub database: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnListOutput {
    pub columns: Vec<ColumnDescriptor>,
}

/// Input for adding a column.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnAddInput {
    pub database: String,
    pub table: String,
    pub column: ColumnSpec,
}

/// Input for modifying (and optionally renaming) a column.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnModifyInput {
    pub database: String,
    pub table: String,
    /// Current name; `column.name` differing from this triggers a rename.
    pub old_name: String,
    pub column: ColumnSpec,
}

/// Input for dropping a column.
#[derive(Debug, Clone, Deserialize)]
pub struct ColumnDropInput {
    pub database: String,
    pub table: String,
    pub column: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ColumnActionOutput {
    pub message: String,
}

/// Handler for column structure operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct ColumnHandler;

impl ColumnHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        session: &Session,
        input: ColumnListInput,
    ) -> AdminResult<ColumnListOutput> {
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        let columns = db::describe_columns(&mut conn, &input.database, &input.table).await?;
        Ok(ColumnListOutput { columns })
    }

    pub async fn add(
        &self,
        session: &Session,
        input: ColumnAddInput,
    ) -> AdminResult<ColumnActionOutput> {
        let sql = build_add_column(&input.table, &input.column)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        conn.execute(sql.as_str())
            .await
            .map_err(|e| AdminError::execution("Adding column failed", e))?;

        info!(table = %input.table, column = %input.column.name, "Column added");
        Ok(ColumnActionOutput {
            message: format!("Column '{}' added", input.column.name),
        })
    }

    /// Retype and optionally rename a column.
    ///
    /// The two statements are not atomic: when the rename fails the column
    /// is already retyped, and the error prefix says which step broke.
    pub async fn modify(
        &self,
        session: &Session,
        input: ColumnModifyInput,
    ) -> AdminResult<ColumnActionOutput> {
        let statements = build_modify_column(&input.table, &input.old_name, &input.column)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;

        let mut steps = statements.iter();
        if let Some(modify_sql) = steps.next() {
            conn.execute(modify_sql.as_str())
                .await
                .map_err(|e| AdminError::execution("Modifying column failed", e))?;
        }
        for rename_sql in steps {
            conn.execute(rename_sql.as_str())
                .await
                .map_err(|e| AdminError::execution("Renaming column failed", e))?;
        }

        info!(
            table = %input.table,
            old_name = %input.old_name,
            new_name = %input.column.name,
            "Column modified"
        );
        Ok(ColumnActionOutput {
            message: format!("Column '{}' modified", input.old_name),
        })
    }

    pub async fn drop(
        &self,
        session: &Session,
        input: ColumnDropInput,
    ) -> AdminResult<ColumnActionOutput> {
        let sql = build_drop_column(&input.table, &input.column)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        conn.execute(sql.as_str())
            .await
            .map_err(|e| AdminError::execution("Dropping column failed", e))?;

        info!(table = %input.table, column = %input.column, "Column dropped");
        Ok(ColumnActionOutput {
            message: format!("Column '{}' dropped", input.column),
        })
    }
}
