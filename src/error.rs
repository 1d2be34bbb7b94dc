//! Error types for the admin server.
//!
//! This module defines all error types using `thiserror`. Every error that
//! reaches the HTTP boundary is rendered as `{"success": false, "error": ...}`
//! with a status code matching its class, so the front end can distinguish
//! user-fixable input problems from driver failures.

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdminError {
    /// Rejected before any database call. The message names the violated rule.
    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    /// No usable database credentials for this request. Distinct from a
    /// connection failure so the front end can send the user back to login.
    #[error("Database credentials missing: {message}")]
    CredentialsMissing { message: String },

    /// Single-record fetch by primary key returned zero rows. A zero-row
    /// filtered list or a zero-row delete is NOT this error.
    #[error("Not found: {message}")]
    NotFound { message: String },

    /// Could not reach or authenticate against the MySQL server.
    #[error("Connection failed: {message}")]
    Connection { message: String },

    /// The driver rejected a statement. The native error text is preserved
    /// under an operation-specific prefix so the failing phase is identifiable.
    #[error("{context}: {message}")]
    Execution { context: String, message: String },

    /// An external helper binary is not present on this host. Callers fall
    /// back to the built-in path instead of surfacing this to the user.
    #[error("External tool unavailable: {tool}")]
    ToolUnavailable { tool: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl AdminError {
    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create a credentials-missing error.
    pub fn credentials_missing(message: impl Into<String>) -> Self {
        Self::CredentialsMissing {
            message: message.into(),
        }
    }

    /// Create a not-found error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Wrap a driver error with an operation context, e.g.
    /// `AdminError::execution("Insert failed", err)`.
    pub fn execution(context: impl Into<String>, message: impl ToString) -> Self {
        Self::Execution {
            context: context.into(),
            message: message.to_string(),
        }
    }

    /// Create a tool-unavailable error.
    pub fn tool_unavailable(tool: impl Into<String>) -> Self {
        Self::ToolUnavailable { tool: tool.into() }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// HTTP status this error maps to at the JSON boundary.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InvalidInput { .. } => StatusCode::BAD_REQUEST,
            Self::CredentialsMissing { .. } => StatusCode::UNAUTHORIZED,
            Self::NotFound { .. } => StatusCode::NOT_FOUND,
            Self::Connection { .. } => StatusCode::BAD_GATEWAY,
            Self::Execution { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ToolUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Convert sqlx errors to AdminError.
///
/// Statement failures should normally go through `AdminError::execution` so
/// they carry an operation prefix; this blanket conversion covers the
/// connection-establishment and decode paths where no statement context
/// exists.
impl From<sqlx::Error> for AdminError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => AdminError::connection(msg.to_string()),
            sqlx::Error::Database(db_err) => {
                AdminError::execution("Database error", db_err.message())
            }
            sqlx::Error::Io(io_err) => AdminError::connection(format!("I/O error: {}", io_err)),
            sqlx::Error::Tls(tls_err) => AdminError::connection(format!("TLS error: {}", tls_err)),
            sqlx::Error::Protocol(msg) => {
                AdminError::connection(format!("Protocol error: {}", msg))
            }
            sqlx::Error::RowNotFound => AdminError::not_found("No rows returned"),
            sqlx::Error::ColumnNotFound(col) => {
                AdminError::internal(format!("Column not found: {}", col))
            }
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => AdminError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                AdminError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => AdminError::internal(format!("Decode error: {}", source)),
            _ => AdminError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

impl IntoResponse for AdminError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = serde_json::json!({
            "success": false,
            "error": self.to_string(),
        });
        (
            status,
            [(header::CONTENT_TYPE, "application/json")],
            body.to_string(),
        )
            .into_response()
    }
}

/// Result type alias for admin operations.
pub type AdminResult<T> = Result<T, AdminError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AdminError::execution("Insert failed", "Duplicate entry '1' for key 'PRIMARY'");
        assert_eq!(
            err.to_string(),
            "Insert failed: Duplicate entry '1' for key 'PRIMARY'"
        );
    }

    #[test]
    fn test_invalid_input_display_names_rule() {
        let err = AdminError::invalid_input("Multiple statements are not allowed");
        assert!(err.to_string().contains("Multiple statements"));
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AdminError::invalid_input("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AdminError::credentials_missing("x").status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AdminError::not_found("x").status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AdminError::connection("x").status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AdminError::tool_unavailable("mysqldump").status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_sqlx_row_not_found_maps_to_not_found() {
        let err: AdminError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, AdminError::NotFound { .. }));
    }

    #[test]
    fn test_tool_unavailable_is_distinguishable() {
        let err = AdminError::tool_unavailable("mysqldump");
        assert!(matches!(err, AdminError::ToolUnavailable { .. }));
        assert!(err.to_string().contains("mysqldump"));
    }
}
