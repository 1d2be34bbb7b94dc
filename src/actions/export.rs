//! SQL dump export.
//!
//! Produces a restorable SQL script for one database or the whole server.
//! When a `mysqldump` binary is available it is spawned and its stdout
//! relayed; otherwise a built-in dumper walks the schema and writes
//! `DROP TABLE` / `SHOW CREATE TABLE` / batched `INSERT` statements. Both
//! paths deliver chunks over a channel so the HTTP layer can stream the
//! download without materializing multi-gigabyte dumps.

use crate::db;
use crate::db::{RowToJson, TypeCategory, column_categories, decode_column};
use crate::error::{AdminError, AdminResult};
use crate::models::{EXPORT_BATCH_ROWS, EXPORT_CHUNK_ROWS};
use crate::session::Credentials;
use crate::sql::escape::{quote_ident, quote_literal};
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::mysql::MySqlRow;
use std::process::Stdio;
use tokio::io::AsyncReadExt;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Bytes read from mysqldump's stdout per relay chunk.
const RELAY_CHUNK_BYTES: usize = 8192;

/// Which databases to dump.
#[derive(Debug, Clone)]
pub enum DumpScope {
    Single(String),
    /// Every non-system database.
    All,
}

/// A dump request: the scope plus the flags controlling what the script
/// contains. Both paths honor the flags, so the mysqldump output and the
/// built-in output agree on what a restore reproduces.
#[derive(Debug, Clone)]
pub struct DumpTarget {
    pub scope: DumpScope,
    /// Emit `CREATE DATABASE IF NOT EXISTS` / `USE` before each database's
    /// statements, so the script restores onto an empty server.
    pub include_create_database: bool,
    /// Skip structure statements and dump row data only.
    pub data_only: bool,
}

impl DumpTarget {
    /// One database, by default without `CREATE DATABASE` so the script
    /// restores into whatever database the client selects.
    pub fn single(database: impl Into<String>) -> Self {
        Self {
            scope: DumpScope::Single(database.into()),
            include_create_database: false,
            data_only: false,
        }
    }

    /// Every non-system database, by default with `CREATE DATABASE`.
    pub fn all() -> Self {
        Self {
            scope: DumpScope::All,
            include_create_database: true,
            data_only: false,
        }
    }

    pub fn suggested_filename(&self) -> String {
        match &self.scope {
            DumpScope::Single(db) => format!("{}.sql", db),
            DumpScope::All => "all-databases.sql".to_string(),
        }
    }
}

/// One unit of dump output, or the error that ended the stream.
pub type DumpChunk = Result<Vec<u8>, AdminError>;

/// Handler for SQL dump exports.
#[derive(Debug, Clone)]
pub struct SqlDumper {
    mysqldump_bin: String,
    disable_mysqldump: bool,
}

impl SqlDumper {
    pub fn new(mysqldump_bin: impl Into<String>, disable_mysqldump: bool) -> Self {
        Self {
            mysqldump_bin: mysqldump_bin.into(),
            disable_mysqldump,
        }
    }

    /// Start a dump and return the chunk stream. The producer runs in its
    /// own task; dropping the receiver cancels it at the next send.
    pub fn dump(&self, credentials: Credentials, target: DumpTarget) -> mpsc::Receiver<DumpChunk> {
        let (tx, rx) = mpsc::channel(8);
        let bin = self.mysqldump_bin.clone();
        let disable = self.disable_mysqldump;

        tokio::spawn(async move {
            if !disable {
                match relay_mysqldump(&bin, &credentials, &target, &tx).await {
                    Ok(()) => return,
                    Err(AdminError::ToolUnavailable { .. }) => {
                        debug!(bin = %bin, "mysqldump not found, using built-in dumper");
                    }
                    Err(e) => {
                        let _ = tx.send(Err(e)).await;
                        return;
                    }
                }
            }
            if let Err(e) = builtin_dump(&credentials, &target, &tx).await {
                let _ = tx.send(Err(e)).await;
            }
        });

        rx
    }
}

/// Send one chunk, treating a closed receiver as terminal.
async fn send_chunk(tx: &mpsc::Sender<DumpChunk>, chunk: Vec<u8>) -> AdminResult<()> {
    tx.send(Ok(chunk))
        .await
        .map_err(|_| AdminError::internal("Dump receiver closed"))
}

/// Argument list for a mysqldump invocation matching the target's flags.
fn mysqldump_args(credentials: &Credentials, target: &DumpTarget) -> Vec<String> {
    let mut args = vec![
        "-h".to_string(),
        credentials.host.clone(),
        "-P".to_string(),
        credentials.port.to_string(),
        "-u".to_string(),
        credentials.user.clone(),
        format!("--password={}", credentials.password),
        "--single-transaction".to_string(),
    ];
    if target.data_only {
        args.push("--no-create-info".to_string());
    } else {
        args.push("--routines".to_string());
        args.push("--triggers".to_string());
        args.push("--events".to_string());
    }
    if !target.include_create_database {
        args.push("--no-create-db".to_string());
    }
    match &target.scope {
        DumpScope::Single(database) => {
            args.push("--databases".to_string());
            args.push(database.clone());
        }
        DumpScope::All => {
            if target.include_create_database {
                args.push("--add-drop-database".to_string());
            }
            args.push("--all-databases".to_string());
        }
    }
    args
}

/// Spawn mysqldump and relay its stdout.
///
/// Only a failure to find the binary falls back to the built-in dumper;
/// once bytes have flowed a later failure is surfaced as an error.
async fn relay_mysqldump(
    bin: &str,
    credentials: &Credentials,
    target: &DumpTarget,
    tx: &mpsc::Sender<DumpChunk>,
) -> AdminResult<()> {
    let mut command = Command::new(bin);
    command.args(mysqldump_args(credentials, target));

    let mut child = command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                AdminError::tool_unavailable(bin)
            } else {
                AdminError::internal(format!("Failed to spawn {}: {}", bin, e))
            }
        })?;

    let mut stdout = child
        .stdout
        .take()
        .ok_or_else(|| AdminError::internal("mysqldump stdout not captured"))?;
    let mut stderr = child
        .stderr
        .take()
        .ok_or_else(|| AdminError::internal("mysqldump stderr not captured"))?;

    let mut buf = vec![0u8; RELAY_CHUNK_BYTES];
    loop {
        let n = stdout
            .read(&mut buf)
            .await
            .map_err(|e| AdminError::internal(format!("Reading mysqldump output failed: {}", e)))?;
        if n == 0 {
            break;
        }
        send_chunk(tx, buf[..n].to_vec()).await?;
    }

    let mut err_text = String::new();
    stderr.read_to_string(&mut err_text).await.ok();
    let status = child
        .wait()
        .await
        .map_err(|e| AdminError::internal(format!("Waiting for mysqldump failed: {}", e)))?;
    if !status.success() {
        warn!(status = %status, "mysqldump exited with failure");
        return Err(AdminError::execution(
            "mysqldump failed",
            err_text.lines().last().unwrap_or("unknown error"),
        ));
    }

    info!("mysqldump export complete");
    Ok(())
}

/// Dump header written before any statements.
fn dump_header(target: &DumpTarget) -> String {
    let scope = match &target.scope {
        DumpScope::Single(db) => format!("Database: {}", db),
        DumpScope::All => "All databases".to_string(),
    };
    format!(
        "-- MySQL dump\n-- Generated by mysql-admin-server {}\n-- {}\n-- Date: {}\n\nSET FOREIGN_KEY_CHECKS = 0;\n\n",
        env!("CARGO_PKG_VERSION"),
        scope,
        Utc::now().format("%Y-%m-%d %H:%M:%S UTC")
    )
}

/// Built-in dumper used when mysqldump is unavailable or disabled.
async fn builtin_dump(
    credentials: &Credentials,
    target: &DumpTarget,
    tx: &mpsc::Sender<DumpChunk>,
) -> AdminResult<()> {
    send_chunk(tx, dump_header(target).into_bytes()).await?;

    match &target.scope {
        DumpScope::Single(database) => {
            dump_one_database(credentials, database, target, tx).await?;
        }
        DumpScope::All => {
            let mut conn = db::connect(credentials, None).await?;
            let databases = db::list_databases(&mut conn).await?;
            drop(conn);
            for database in databases
                .iter()
                .filter(|name| !db::is_system_database(name))
            {
                dump_one_database(credentials, database, target, tx).await?;
            }
        }
    }

    send_chunk(tx, b"SET FOREIGN_KEY_CHECKS = 1;\n".to_vec()).await?;
    info!("Built-in export complete");
    Ok(())
}

/// Dump one database's structure and data per the target's flags.
async fn dump_one_database(
    credentials: &Credentials,
    database: &str,
    target: &DumpTarget,
    tx: &mpsc::Sender<DumpChunk>,
) -> AdminResult<()> {
    let mut conn = db::connect(credentials, Some(database)).await?;

    if target.include_create_database {
        let quoted = quote_ident(database)?;
        send_chunk(
            tx,
            format!(
                "CREATE DATABASE IF NOT EXISTS {};\nUSE {};\n\n",
                quoted, quoted
            )
            .into_bytes(),
        )
        .await?;
    }

    let tables = db::list_tables(&mut conn, database).await?;
    for table in &tables {
        let quoted = quote_ident(&table.name)?;

        if !target.data_only {
            let drop_kind = if table.kind.is_view() { "VIEW" } else { "TABLE" };
            let create = db::show_create_table(&mut conn, &table.name).await?;
            send_chunk(
                tx,
                format!(
                    "--\n-- Structure for {} {}\n--\nDROP {} IF EXISTS {};\n{};\n\n",
                    table.kind, quoted, drop_kind, quoted, create
                )
                .into_bytes(),
            )
            .await?;
        }

        // Views carry no data of their own
        if !table.kind.is_view() {
            dump_table_rows(&mut conn, &table.name, tx).await?;
        }
    }

    Ok(())
}

/// Dump a table's rows as batched multi-value INSERT statements, fetching
/// in fixed-size pages so memory stays bounded for large tables.
async fn dump_table_rows(
    conn: &mut sqlx::mysql::MySqlConnection,
    table: &str,
    tx: &mpsc::Sender<DumpChunk>,
) -> AdminResult<()> {
    let quoted = quote_ident(table)?;
    let mut offset: u64 = 0;

    loop {
        let sql = format!(
            "SELECT * FROM {} LIMIT {} OFFSET {}",
            quoted, EXPORT_CHUNK_ROWS, offset
        );
        let rows = db::fetch_all(conn, &sql, &[])
            .await
            .map_err(|e| AdminError::execution(format!("Dumping table '{}' failed", table), e))?;
        if rows.is_empty() {
            break;
        }

        let first = &rows[0];
        let categories = column_categories(first);
        let column_list = first
            .column_names()
            .iter()
            .map(|name| quote_ident(name))
            .collect::<AdminResult<Vec<_>>>()?
            .join(", ");

        let tuples: Vec<String> = rows
            .iter()
            .map(|row| {
                let cells: Vec<String> = categories
                    .iter()
                    .enumerate()
                    .map(|(idx, category)| sql_literal(row, idx, *category))
                    .collect();
                format!("({})", cells.join(", "))
            })
            .collect();
        for statement in insert_statements(&quoted, &column_list, &tuples) {
            send_chunk(tx, statement.into_bytes()).await?;
        }
        send_chunk(tx, b"\n".to_vec()).await?;

        let fetched = rows.len() as u64;
        offset += fetched;
        if fetched < EXPORT_CHUNK_ROWS {
            break;
        }
    }

    Ok(())
}

/// Assemble multi-value INSERT statements from rendered row tuples, at most
/// `EXPORT_BATCH_ROWS` tuples per statement.
fn insert_statements(quoted_table: &str, column_list: &str, tuples: &[String]) -> Vec<String> {
    tuples
        .chunks(EXPORT_BATCH_ROWS)
        .map(|batch| {
            format!(
                "INSERT INTO {} ({}) VALUES\n{};\n",
                quoted_table,
                column_list,
                batch.join(",\n")
            )
        })
        .collect()
}

/// Render one cell as a SQL literal for dump output. Binary columns become
/// hex literals so the dump survives non-UTF-8 data byte for byte.
fn sql_literal(row: &MySqlRow, idx: usize, category: TypeCategory) -> String {
    use sqlx::Row;

    if category == TypeCategory::Binary {
        return match row.try_get::<Option<Vec<u8>>, _>(idx) {
            Ok(Some(bytes)) => bytes_literal(&bytes),
            _ => "NULL".to_string(),
        };
    }

    json_literal(&decode_column(row, idx, category))
}

fn bytes_literal(bytes: &[u8]) -> String {
    if bytes.is_empty() {
        return "''".to_string();
    }
    let hex: String = bytes.iter().map(|b| format!("{:02X}", b)).collect();
    format!("0x{}", hex)
}

/// SQL literal for a decoded JSON value. NULL stays an unquoted keyword,
/// booleans and numbers stay bare, everything else is a quoted string.
fn json_literal(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => "NULL".to_string(),
        JsonValue::Bool(true) => "1".to_string(),
        JsonValue::Bool(false) => "0".to_string(),
        JsonValue::Number(n) => n.to_string(),
        JsonValue::String(s) => quote_literal(s),
        other => quote_literal(&other.to_string()),
    }
}
