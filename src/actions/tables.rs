//! Table listing, inspection and lifecycle.
//!
//! Lists the tables and views of one database with their sizes, reflects a
//! full table descriptor, and handles create/drop/rename. Create and rename
//! check for an existing object of the target name first, so the user sees
//! a clear conflict message instead of a raw driver error.

use crate::db;
use crate::error::{AdminError, AdminResult};
use crate::models::TableDescriptor;
use crate::session::Session;
use crate::sql::ddl::{build_create_table, build_drop_table, build_rename_table};
use serde::{Deserialize, Serialize};
use sqlx::Executor;
use tracing::info;

/// Default storage engine for created tables.
pub const DEFAULT_ENGINE: &str = "InnoDB";

fn default_engine() -> String {
    DEFAULT_ENGINE.to_string()
}

/// Input for listing the tables of a database.
#[derive(Debug, Clone, Deserialize)]
pub struct TableListInput {
    pub database: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableListOutput {
    pub tables: Vec<TableDescriptor>,
}

/// Input for reflecting one table.
#[derive(Debug, Clone, Deserialize)]
pub struct TableGetInput {
    pub database: String,
    pub table: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TableGetOutput {
    pub table: TableDescriptor,
    /// The server's own `SHOW CREATE TABLE` output.
    pub create_statement: String,
}

/// Input for creating a table from a raw definition block.
#[derive(Debug, Clone, Deserialize)]
pub struct TableCreateInput {
    pub database: String,
    pub name: String,
    /// Column definitions, one per line (or comma-separated on one line).
    pub definition: String,
    #[serde(default = "default_engine")]
    pub engine: String,
}

/// Input for dropping a table.
#[derive(Debug, Clone, Deserialize)]
pub struct TableDropInput {
    pub database: String,
    pub table: String,
}

/// Input for renaming a table.
#[derive(Debug, Clone, Deserialize)]
pub struct TableRenameInput {
    pub database: String,
    pub table: String,
    pub new_name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct TableActionOutput {
    pub message: String,
}

/// Handler for table lifecycle operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct TableHandler;

impl TableHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(
        &self,
        session: &Session,
        input: TableListInput,
    ) -> AdminResult<TableListOutput> {
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        let tables = db::list_tables(&mut conn, &input.database).await?;
        Ok(TableListOutput { tables })
    }

    pub async fn get(&self, session: &Session, input: TableGetInput) -> AdminResult<TableGetOutput> {
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        let table = db::describe_table(&mut conn, &input.database, &input.table).await?;
        let create_statement = db::show_create_table(&mut conn, &input.table).await?;
        Ok(TableGetOutput {
            table,
            create_statement,
        })
    }

    pub async fn create(
        &self,
        session: &Session,
        input: TableCreateInput,
    ) -> AdminResult<TableActionOutput> {
        let sql = build_create_table(&input.name, &input.definition, &input.engine)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;

        if db::table_exists(&mut conn, &input.database, &input.name).await? {
            return Err(AdminError::invalid_input(format!(
                "Table '{}' already exists",
                input.name
            )));
        }
        conn.execute(sql.as_str())
            .await
            .map_err(|e| AdminError::execution("Creating table failed", e))?;

        info!(database = %input.database, table = %input.name, "Table created");
        Ok(TableActionOutput {
            message: format!("Table '{}' created", input.name),
        })
    }

    pub async fn drop(
        &self,
        session: &Session,
        input: TableDropInput,
    ) -> AdminResult<TableActionOutput> {
        let sql = build_drop_table(&input.table)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;
        conn.execute(sql.as_str())
            .await
            .map_err(|e| AdminError::execution("Dropping table failed", e))?;

        info!(database = %input.database, table = %input.table, "Table dropped");
        Ok(TableActionOutput {
            message: format!("Table '{}' dropped", input.table),
        })
    }

    /// Rename a table. The destination name is checked against existing
    /// tables and views before the statement runs.
    pub async fn rename(
        &self,
        session: &Session,
        input: TableRenameInput,
    ) -> AdminResult<TableActionOutput> {
        let sql = build_rename_table(&input.table, &input.new_name)?;
        let mut conn = db::connect(&session.credentials, Some(&input.database)).await?;

        if db::table_exists(&mut conn, &input.database, &input.new_name).await? {
            return Err(AdminError::invalid_input(format!(
                "A table or view named '{}' already exists",
                input.new_name
            )));
        }
        conn.execute(sql.as_str())
            .await
            .map_err(|e| AdminError::execution("Renaming table failed", e))?;

        info!(
            database = %input.database,
            table = %input.table,
            new_name = %input.new_name,
            "Table renamed"
        );
        Ok(TableActionOutput {
            message: format!("Table '{}' renamed to '{}'", input.table, input.new_name),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_input_engine_default() {
        let json = r#"{
            "database": "app",
            "name": "products",
            "definition": "id INT PRIMARY KEY\nname VARCHAR(50)"
        }"#;
        let input: TableCreateInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.engine, "InnoDB");
    }

    #[test]
    fn test_rename_input_deserialization() {
        let json = r#"{"database": "app", "table": "users", "new_name": "members"}"#;
        let input: TableRenameInput = serde_json::from_str(json).unwrap();
        assert_eq!(input.new_name, "members");
    }
}
