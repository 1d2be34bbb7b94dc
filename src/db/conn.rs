//! Per-request MySQL connections and statement execution.
//!
//! Every HTTP request opens one connection from the session's credentials,
//! runs its statements sequentially, and drops the connection before the
//! response completes. No pool, no cross-request state.

use crate::error::{AdminError, AdminResult};
use crate::models::SqlValue;
use crate::session::Credentials;
use serde_json::Value as JsonValue;
use sqlx::mysql::{MySql, MySqlArguments, MySqlConnectOptions, MySqlConnection, MySqlRow};
use sqlx::query::Query;
use sqlx::{ConnectOptions, Executor, Row};
use std::time::Duration;
use tracing::debug;

/// Ceiling on connection establishment; statements themselves run without
/// a timeout so long exports are not cut off.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Open one connection, optionally scoped to a database.
pub async fn connect(creds: &Credentials, database: Option<&str>) -> AdminResult<MySqlConnection> {
    let mut options = MySqlConnectOptions::new()
        .host(&creds.host)
        .port(creds.port)
        .username(&creds.user)
        .password(&creds.password);
    if let Some(db) = database {
        options = options.database(db);
    }
    debug!(host = %creds.host, port = creds.port, database = ?database, "Opening connection");
    tokio::time::timeout(CONNECT_TIMEOUT, options.connect())
        .await
        .map_err(|_| {
            AdminError::connection(format!(
                "Timed out connecting to {}:{}",
                creds.host, creds.port
            ))
        })?
        .map_err(|e| AdminError::connection(e.to_string()))
}

/// Bind one value to the next placeholder.
pub fn bind_value<'q>(
    query: Query<'q, MySql, MySqlArguments>,
    value: &'q SqlValue,
) -> Query<'q, MySql, MySqlArguments> {
    match value {
        SqlValue::Null => query.bind(Option::<String>::None),
        SqlValue::Bool(b) => query.bind(*b),
        SqlValue::Int(i) => query.bind(*i),
        SqlValue::Float(f) => query.bind(*f),
        SqlValue::String(s) => query.bind(s.as_str()),
        SqlValue::Bytes(b) => query.bind(b.as_slice()),
    }
}

fn bind_all<'q>(
    sql: &'q str,
    binds: &'q [SqlValue],
) -> Query<'q, MySql, MySqlArguments> {
    let mut query = sqlx::query(sql);
    for value in binds {
        query = bind_value(query, value);
    }
    query
}

/// Fetch all rows of a statement. An empty bind list skips the prepared
/// statement entirely and runs the plain query; both paths return the same
/// rows.
pub async fn fetch_all(
    conn: &mut MySqlConnection,
    sql: &str,
    binds: &[SqlValue],
) -> Result<Vec<MySqlRow>, sqlx::Error> {
    if binds.is_empty() {
        conn.fetch_all(sql).await
    } else {
        bind_all(sql, binds).fetch_all(conn).await
    }
}

/// Execute a statement, returning (affected rows, last insert id).
pub async fn execute(
    conn: &mut MySqlConnection,
    sql: &str,
    binds: &[SqlValue],
) -> Result<(u64, u64), sqlx::Error> {
    let result = if binds.is_empty() {
        conn.execute(sql).await?
    } else {
        bind_all(sql, binds).execute(conn).await?
    };
    Ok((result.rows_affected(), result.last_insert_id()))
}

/// Fetch a single unsigned count, e.g. from `SELECT COUNT(*)`.
pub async fn fetch_count(
    conn: &mut MySqlConnection,
    sql: &str,
    binds: &[SqlValue],
) -> Result<u64, sqlx::Error> {
    let row = if binds.is_empty() {
        conn.fetch_one(sql).await?
    } else {
        bind_all(sql, binds).fetch_one(conn).await?
    };
    // COUNT(*) comes back as signed or unsigned depending on context
    if let Ok(v) = row.try_get::<i64, _>(0) {
        return Ok(v.max(0) as u64);
    }
    row.try_get::<u64, _>(0)
}

/// Materialize fetched rows as JSON maps.
pub fn rows_to_json(rows: &[MySqlRow]) -> Vec<serde_json::Map<String, JsonValue>> {
    use crate::db::value::RowToJson;
    rows.iter().map(|row| row.to_json_map()).collect()
}
