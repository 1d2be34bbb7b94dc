//! HTTP server for the admin API.
//!
//! One JSON endpoint per action. Requests after login carry the session
//! token as a bearer Authorization header; every handler resolves it to a
//! session before touching the database. The CSV export and the
//! all-databases dump answer with file downloads; a single-database dump
//! comes back buffered in the JSON body.

use crate::actions::{
    ColumnHandler, CsvExporter, DatabaseHandler, DumpScope, DumpTarget, ImportHandler,
    QueryHandler, RecordHandler, SqlDumper, TableHandler,
};
use crate::actions::columns::{ColumnAddInput, ColumnDropInput, ColumnListInput, ColumnModifyInput};
use crate::actions::csv::CsvExportInput;
use crate::actions::databases::{DatabaseCreateInput, DatabaseDropInput};
use crate::actions::import::ImportInput;
use crate::actions::query::AdhocQueryInput;
use crate::actions::records::{
    RecordDeleteInput, RecordGetInput, RecordInsertInput, RecordListInput, RecordUpdateInput,
};
use crate::actions::tables::{
    TableCreateInput, TableDropInput, TableGetInput, TableListInput, TableRenameInput,
};
use crate::config::Config;
use crate::error::{AdminError, AdminResult};
use crate::session::{Credentials, Session, SessionStore};
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, Response, header};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use serde::Deserialize;
use serde_json::json;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Shared state behind every route.
#[derive(Clone)]
pub struct AppState {
    sessions: SessionStore,
    records: RecordHandler,
    queries: QueryHandler,
    columns: ColumnHandler,
    tables: TableHandler,
    databases: DatabaseHandler,
    imports: ImportHandler,
    csv: CsvExporter,
    dumper: SqlDumper,
}

impl AppState {
    pub fn new(config: &Config, sessions: SessionStore) -> Self {
        let limits = config.row_limit_policy();
        Self {
            sessions,
            records: RecordHandler::new(),
            queries: QueryHandler::new(limits),
            columns: ColumnHandler::new(),
            tables: TableHandler::new(),
            databases: DatabaseHandler::new(),
            imports: ImportHandler::new(),
            csv: CsvExporter::new(limits),
            dumper: SqlDumper::new(&config.mysqldump_bin, config.disable_mysqldump),
        }
    }
}

/// Extract the bearer token from the Authorization header.
fn bearer_token(headers: &HeaderMap) -> AdminResult<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AdminError::credentials_missing("Missing bearer token"))
}

async fn session_for(state: &AppState, headers: &HeaderMap) -> AdminResult<Session> {
    state.sessions.get(bearer_token(headers)?).await
}

/// Serialize an action output with the `success` flag every JSON response
/// carries. Error responses get their flag from the error type.
fn ok_body<T: serde::Serialize>(value: &T) -> AdminResult<Json<serde_json::Value>> {
    let mut body = serde_json::to_value(value)
        .map_err(|e| AdminError::internal(format!("Serializing response failed: {}", e)))?;
    if let serde_json::Value::Object(map) = &mut body {
        map.insert("success".to_string(), json!(true));
    }
    Ok(Json(body))
}

// --- session endpoints ---

async fn login(
    State(state): State<AppState>,
    Json(credentials): Json<Credentials>,
) -> AdminResult<impl IntoResponse> {
    let token = state.sessions.login(credentials).await?;
    Ok(Json(json!({ "success": true, "token": token })))
}

async fn logout(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AdminResult<impl IntoResponse> {
    let removed = state.sessions.logout(bearer_token(&headers)?).await;
    Ok(Json(json!({ "success": true, "loggedOut": removed })))
}

async fn session_info(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    Ok(Json(json!({
        "success": true,
        "currentDatabase": session.current_database,
        "currentTable": session.current_table,
    })))
}

#[derive(Debug, Deserialize)]
struct SessionSelectInput {
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    table: Option<String>,
}

async fn session_select(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SessionSelectInput>,
) -> AdminResult<impl IntoResponse> {
    let token = bearer_token(&headers)?;
    if input.database.is_some() {
        state
            .sessions
            .set_current_database(token, input.database)
            .await?;
    }
    if input.table.is_some() {
        state.sessions.set_current_table(token, input.table).await?;
    }
    let session = state.sessions.get(token).await?;
    Ok(Json(json!({
        "success": true,
        "currentDatabase": session.current_database,
        "currentTable": session.current_table,
    })))
}

// --- database endpoints ---

async fn databases_list(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.databases.list(&session).await?)
}

async fn databases_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<DatabaseCreateInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.databases.create(&session, input).await?)
}

async fn databases_drop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<DatabaseDropInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.databases.drop(&session, input).await?)
}

// --- table endpoints ---

async fn tables_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TableListInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.tables.list(&session, input).await?)
}

async fn tables_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TableGetInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.tables.get(&session, input).await?)
}

async fn tables_create(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TableCreateInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.tables.create(&session, input).await?)
}

async fn tables_drop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TableDropInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.tables.drop(&session, input).await?)
}

async fn tables_rename(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<TableRenameInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.tables.rename(&session, input).await?)
}

// --- column endpoints ---

async fn columns_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ColumnListInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.columns.list(&session, input).await?)
}

async fn columns_add(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ColumnAddInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.columns.add(&session, input).await?)
}

async fn columns_modify(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ColumnModifyInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.columns.modify(&session, input).await?)
}

async fn columns_drop(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ColumnDropInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.columns.drop(&session, input).await?)
}

// --- record endpoints ---

async fn records_list(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RecordListInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.records.list(&session, input).await?)
}

async fn records_get(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RecordGetInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.records.get(&session, input).await?)
}

async fn records_insert(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RecordInsertInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.records.insert(&session, input).await?)
}

async fn records_update(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RecordUpdateInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.records.update(&session, input).await?)
}

async fn records_delete(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<RecordDeleteInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.records.delete(&session, input).await?)
}

// --- query / import / export endpoints ---

async fn query_execute(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<AdhocQueryInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.queries.execute(&session, input).await?)
}

async fn import_run(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<ImportInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    ok_body(&state.imports.run(&session, input).await?)
}

async fn export_csv(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<CsvExportInput>,
) -> AdminResult<impl IntoResponse> {
    let session = session_for(&state, &headers).await?;
    let document = state.csv.export(&session, input).await?;
    Response::builder()
        .header(header::CONTENT_TYPE, "text/csv; charset=utf-8")
        .header(
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", document.filename),
        )
        .body(Body::from(document.content))
        .map_err(|e| AdminError::internal(format!("Building CSV response failed: {}", e)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SqlExportInput {
    #[serde(default)]
    database: Option<String>,
    #[serde(default)]
    all: bool,
    /// Emit `CREATE DATABASE` / `USE` preambles. Defaults to the mode's
    /// convention: off for a single database, on for the whole server.
    #[serde(default)]
    include_create_database: Option<bool>,
    /// Dump row data only, without structure statements.
    #[serde(default)]
    data_only: bool,
}

impl SqlExportInput {
    fn dump_target(self) -> AdminResult<DumpTarget> {
        let mut target = if self.all {
            DumpTarget::all()
        } else {
            let database = self.database.ok_or_else(|| {
                AdminError::invalid_input("Either 'database' or 'all' must be given")
            })?;
            DumpTarget::single(database)
        };
        if let Some(include) = self.include_create_database {
            target.include_create_database = include;
        }
        target.data_only = self.data_only;
        Ok(target)
    }
}

/// Dump one database as a buffered JSON payload, or every non-system
/// database as a streamed download.
async fn export_sql(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(input): Json<SqlExportInput>,
) -> AdminResult<axum::response::Response> {
    let session = session_for(&state, &headers).await?;
    let target = input.dump_target()?;
    let filename = target.suggested_filename();

    if matches!(target.scope, DumpScope::All) {
        let rx = state.dumper.dump(session.credentials.clone(), target);
        let stream = futures_util::stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|chunk| (chunk.map(Bytes::from), rx))
        });
        return Response::builder()
            .header(header::CONTENT_TYPE, "application/octet-stream")
            .header(
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            )
            .body(Body::from_stream(stream))
            .map(IntoResponse::into_response)
            .map_err(|e| AdminError::internal(format!("Building dump response failed: {}", e)));
    }

    let mut rx = state.dumper.dump(session.credentials.clone(), target);
    let mut sql = String::new();
    while let Some(chunk) = rx.recv().await {
        sql.push_str(&String::from_utf8_lossy(&chunk?));
    }
    Ok(Json(json!({ "success": true, "filename": filename, "sql": sql })).into_response())
}

/// Build the full API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/login", post(login))
        .route("/api/logout", post(logout))
        .route("/api/session", get(session_info))
        .route("/api/session/select", post(session_select))
        .route("/api/databases", get(databases_list))
        .route("/api/databases/create", post(databases_create))
        .route("/api/databases/drop", post(databases_drop))
        .route("/api/tables/list", post(tables_list))
        .route("/api/tables/get", post(tables_get))
        .route("/api/tables/create", post(tables_create))
        .route("/api/tables/drop", post(tables_drop))
        .route("/api/tables/rename", post(tables_rename))
        .route("/api/columns/list", post(columns_list))
        .route("/api/columns/add", post(columns_add))
        .route("/api/columns/modify", post(columns_modify))
        .route("/api/columns/drop", post(columns_drop))
        .route("/api/records/list", post(records_list))
        .route("/api/records/get", post(records_get))
        .route("/api/records/insert", post(records_insert))
        .route("/api/records/update", post(records_update))
        .route("/api/records/delete", post(records_delete))
        .route("/api/query", post(query_execute))
        .route("/api/import", post(import_run))
        .route("/api/export/csv", post(export_csv))
        .route("/api/export/sql", post(export_sql))
        .with_state(state)
}

/// The HTTP server wrapping the router with bind and shutdown handling.
pub struct HttpServer {
    state: AppState,
    host: String,
    port: u16,
}

impl HttpServer {
    pub fn new(config: &Config, sessions: SessionStore) -> Self {
        Self {
            state: AppState::new(config, sessions),
            host: config.http_host.clone(),
            port: config.http_port,
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub async fn run(self) -> AdminResult<()> {
        let bind_addr = self.bind_addr();
        info!("Starting admin server on {}", bind_addr);

        let app = router(self.state);
        let listener = TcpListener::bind(&bind_addr).await.map_err(|e| {
            AdminError::internal(format!("Failed to bind to {}: {}", bind_addr, e))
        })?;

        // Streamed downloads may keep the server alive indefinitely, so
        // force exit after a timeout once the shutdown signal arrives
        const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

        let shutdown_notify = std::sync::Arc::new(tokio::sync::Notify::new());
        let shutdown_notify_clone = shutdown_notify.clone();
        let shutdown_signal = async move {
            wait_for_signal().await;
            shutdown_notify_clone.notify_one();
        };

        let server = axum::serve(listener, app).with_graceful_shutdown(shutdown_signal);

        tokio::select! {
            result = server => {
                match result {
                    Ok(()) => info!("HTTP server stopped"),
                    Err(e) => {
                        error!(error = %e, "HTTP server error");
                        return Err(AdminError::internal(format!("HTTP server error: {}", e)));
                    }
                }
            }
            _ = async {
                shutdown_notify.notified().await;
                info!(
                    timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                    "Waiting for connections to close (send signal again to force exit)..."
                );
                tokio::select! {
                    _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                        warn!("Graceful shutdown timeout, forcing exit");
                    }
                    _ = wait_for_signal() => {
                        warn!("Received second signal, forcing immediate exit");
                    }
                }
            } => {}
        }

        Ok(())
    }
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = signal::ctrl_c();

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_state() -> AppState {
        AppState::new(&Config::default_config(), SessionStore::new())
    }

    #[test]
    fn test_bind_addr() {
        let server = HttpServer::new(&Config::default_config(), SessionStore::new());
        assert_eq!(server.bind_addr(), "127.0.0.1:8080");
    }

    #[test]
    fn test_router_builds() {
        let _ = router(test_state());
    }

    #[test]
    fn test_sql_export_input_flags_reach_the_target() {
        let input: SqlExportInput = serde_json::from_str(
            r#"{"database": "shop", "includeCreateDatabase": true, "dataOnly": true}"#,
        )
        .unwrap();
        let target = input.dump_target().unwrap();
        assert!(matches!(target.scope, DumpScope::Single(ref db) if db == "shop"));
        assert!(target.include_create_database);
        assert!(target.data_only);
    }

    #[test]
    fn test_sql_export_input_defaults_follow_the_mode() {
        let single: SqlExportInput =
            serde_json::from_str(r#"{"database": "shop"}"#).unwrap();
        assert!(!single.dump_target().unwrap().include_create_database);

        let all: SqlExportInput = serde_json::from_str(r#"{"all": true}"#).unwrap();
        assert!(all.dump_target().unwrap().include_create_database);

        let neither: SqlExportInput = serde_json::from_str(r#"{}"#).unwrap();
        assert!(neither.dump_target().is_err());
    }

    #[test]
    fn test_ok_body_carries_success_flag() {
        let body = ok_body(&json!({ "total": 3 })).unwrap();
        assert_eq!(body.0["success"], json!(true));
        assert_eq!(body.0["total"], json!(3));
    }

    #[test]
    fn test_bearer_token_extraction() {
        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer abc123".parse().unwrap());
        assert_eq!(bearer_token(&headers).unwrap(), "abc123");
    }

    #[test]
    fn test_bearer_token_missing_or_malformed() {
        let headers = HeaderMap::new();
        assert!(matches!(
            bearer_token(&headers).unwrap_err(),
            AdminError::CredentialsMissing { .. }
        ));

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Basic abc".parse().unwrap());
        assert!(bearer_token(&headers).is_err());

        let mut headers = HeaderMap::new();
        headers.insert(header::AUTHORIZATION, "Bearer ".parse().unwrap());
        assert!(bearer_token(&headers).is_err());
    }
}
