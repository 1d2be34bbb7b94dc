//! Database listing and lifecycle.
//!
//! Lists the server's schemas (flagging system ones so the UI can grey them
//! out), and creates or drops databases. System schemas are refused for
//! drop regardless of the connected user's privileges.

use crate::db;
use crate::error::{AdminError, AdminResult};
use crate::session::Session;
use crate::sql::escape::Ident;
use serde::{Deserialize, Serialize};
use sqlx::Executor;
use tracing::info;

/// Default character set for created databases.
pub const DEFAULT_CHARSET: &str = "utf8mb4";

/// Default collation for created databases.
pub const DEFAULT_COLLATION: &str = "utf8mb4_unicode_ci";

fn default_charset() -> String {
    DEFAULT_CHARSET.to_string()
}

fn default_collation() -> String {
    DEFAULT_COLLATION.to_string()
}

/// One schema in the databases listing.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatabaseEntry {
    pub name: String,
    pub is_system: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseListOutput {
    pub databases: Vec<DatabaseEntry>,
}

/// Input for creating a database.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseCreateInput {
    pub name: String,
    #[serde(default = "default_charset")]
    pub charset: String,
    #[serde(default = "default_collation")]
    pub collation: String,
}

/// Input for dropping a database.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseDropInput {
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DatabaseActionOutput {
    pub message: String,
}

/// Handler for database lifecycle operations.
#[derive(Debug, Clone, Copy, Default)]
pub struct DatabaseHandler;

impl DatabaseHandler {
    pub fn new() -> Self {
        Self
    }

    pub async fn list(&self, session: &Session) -> AdminResult<DatabaseListOutput> {
        let mut conn = db::connect(&session.credentials, None).await?;
        let names = db::list_databases(&mut conn).await?;
        let databases = names
            .into_iter()
            .map(|name| DatabaseEntry {
                is_system: db::is_system_database(&name),
                name,
            })
            .collect();
        Ok(DatabaseListOutput { databases })
    }

    pub async fn create(
        &self,
        session: &Session,
        input: DatabaseCreateInput,
    ) -> AdminResult<DatabaseActionOutput> {
        let name = Ident::strict(input.name.as_str())?;
        let charset = Ident::strict(input.charset.as_str())?;
        let collation = Ident::strict(input.collation.as_str())?;
        let sql = format!(
            "CREATE DATABASE {} CHARACTER SET {} COLLATE {}",
            name.quoted(),
            charset,
            collation
        );

        let mut conn = db::connect(&session.credentials, None).await?;
        conn.execute(sql.as_str())
            .await
            .map_err(|e| AdminError::execution("Creating database failed", e))?;

        info!(database = %name, "Database created");
        Ok(DatabaseActionOutput {
            message: format!("Database '{}' created", name),
        })
    }

    pub async fn drop(
        &self,
        session: &Session,
        input: DatabaseDropInput,
    ) -> AdminResult<DatabaseActionOutput> {
        if db::is_system_database(&input.name) {
            return Err(AdminError::invalid_input(format!(
                "Cannot drop system database '{}'",
                input.name
            )));
        }
        let name = Ident::new(input.name.as_str())?;
        let sql = format!("DROP DATABASE {}", name.quoted());

        let mut conn = db::connect(&session.credentials, None).await?;
        conn.execute(sql.as_str())
            .await
            .map_err(|e| AdminError::execution("Dropping database failed", e))?;

        info!(database = %name, "Database dropped");
        Ok(DatabaseActionOutput {
            message: format!("Database '{}' dropped", name),
        })
    }
}
