//! Error types for the MySQL bridge.
//!
//! Every failure that can happen while serving one request or message is a
//! `DbError`. Each front-end converts it into its own error shape: an HTTP
//! status with a JSON body, or a JSON-RPC error object.

use crate::models::{ErrorBody, RpcError, rpc_codes};
use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbError {
    #[error("Invalid JSON body: {message}")]
    InvalidJson { message: String },

    #[error("Unknown tool: {tool}")]
    UnknownTool { tool: String },

    #[error("Method not found: {method}")]
    UnknownMethod { method: String },

    #[error("Missing query parameter")]
    MissingQuery,

    /// Driver message, passed through unmodified.
    #[error("{message}")]
    Connection { message: String },

    #[error("{message}")]
    Query {
        message: String,
        /// e.g., "42S02" for an unknown table
        sql_state: Option<String>,
    },

    #[error("Timeout: {operation} exceeded {elapsed_secs}s")]
    Timeout {
        operation: String,
        elapsed_secs: u64,
    },

    #[error("{message}")]
    Internal { message: String },
}

impl DbError {
    /// Create an invalid JSON error.
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
        }
    }

    /// Create an unknown tool error.
    pub fn unknown_tool(tool: impl Into<String>) -> Self {
        Self::UnknownTool { tool: tool.into() }
    }

    /// Create an unknown method error.
    pub fn unknown_method(method: impl Into<String>) -> Self {
        Self::UnknownMethod {
            method: method.into(),
        }
    }

    /// Create a connection error.
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(message: impl Into<String>, sql_state: Option<String>) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
        }
    }

    /// Create a timeout error.
    pub fn timeout(operation: impl Into<String>, elapsed_secs: u64) -> Self {
        Self::Timeout {
            operation: operation.into(),
            elapsed_secs,
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Wrap a driver error raised while opening a connection.
    pub fn from_connect(err: sqlx::Error) -> Self {
        Self::connection(driver_message(&err))
    }

    /// True for failures reported by (or while talking to) the database.
    pub fn is_database_failure(&self) -> bool {
        matches!(
            self,
            Self::Connection { .. } | Self::Query { .. } | Self::Timeout { .. }
        )
    }

    /// SQLSTATE reported by the server for a failed statement.
    pub fn sql_state(&self) -> Option<&str> {
        match self {
            Self::Query { sql_state, .. } => sql_state.as_deref(),
            _ => None,
        }
    }

    /// True for failures caused by the caller's request rather than the server.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidJson { .. }
                | Self::UnknownTool { .. }
                | Self::UnknownMethod { .. }
                | Self::MissingQuery
        )
    }

    /// HTTP status code for this error on the `/execute` endpoint.
    pub fn status_code(&self) -> StatusCode {
        if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }

    /// Message used in the HTTP `{"error": ...}` body.
    pub fn http_message(&self) -> String {
        match self {
            // The parser detail stays in the logs
            Self::InvalidJson { .. } => "Invalid JSON body".to_string(),
            _ => self.to_string(),
        }
    }
}

/// Message the driver reports for an error. Server-side errors carry the
/// server's own text; everything else uses the driver's display form.
fn driver_message(err: &sqlx::Error) -> String {
    match err {
        sqlx::Error::Database(db_err) => db_err.message().to_string(),
        other => other.to_string(),
    }
}

/// Convert sqlx errors raised while running a statement.
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                DbError::query(db_err.message(), code)
            }
            _ => DbError::query(driver_message(&err), None),
        }
    }
}

impl From<serde_json::Error> for DbError {
    fn from(err: serde_json::Error) -> Self {
        DbError::invalid_json(err.to_string())
    }
}

/// Result type alias for bridge operations.
pub type DbResult<T> = Result<T, DbError>;

impl IntoResponse for DbError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.http_message(),
        };
        (self.status_code(), Json(body)).into_response()
    }
}

/// Convert DbError to a JSON-RPC error object.
impl From<DbError> for RpcError {
    fn from(err: DbError) -> Self {
        if err.is_database_failure() {
            return RpcError::new(rpc_codes::SERVER_ERROR, format!("Database error: {}", err));
        }
        match &err {
            DbError::MissingQuery => RpcError::new(rpc_codes::INVALID_PARAMS, err.to_string()),

            DbError::UnknownTool { .. } | DbError::UnknownMethod { .. } => {
                RpcError::new(rpc_codes::METHOD_NOT_FOUND, err.to_string())
            }

            DbError::InvalidJson { message } => {
                RpcError::new(rpc_codes::INTERNAL_ERROR, message.clone())
            }
            _ => RpcError::new(rpc_codes::INTERNAL_ERROR, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_driver_messages_pass_through() {
        let err = DbError::connection("Access denied for user 'root'@'localhost'");
        assert_eq!(err.to_string(), "Access denied for user 'root'@'localhost'");

        let err = DbError::query("Table 'shop.nope' doesn't exist", Some("42S02".into()));
        assert_eq!(err.to_string(), "Table 'shop.nope' doesn't exist");
        assert_eq!(err.sql_state(), Some("42S02"));
        assert_eq!(DbError::connection("refused").sql_state(), None);
    }

    #[test]
    fn test_validation_messages() {
        assert_eq!(DbError::unknown_tool("bogus").to_string(), "Unknown tool: bogus");
        assert_eq!(
            DbError::unknown_method("ping").to_string(),
            "Method not found: ping"
        );
        assert_eq!(DbError::MissingQuery.to_string(), "Missing query parameter");
    }

    #[test]
    fn test_database_failure_classification() {
        assert!(DbError::connection("refused").is_database_failure());
        assert!(DbError::query("syntax", None).is_database_failure());
        assert!(DbError::timeout("query execution", 5).is_database_failure());
        assert!(!DbError::MissingQuery.is_database_failure());
        assert!(!DbError::internal("boom").is_database_failure());
    }

    // HTTP mapping

    #[test]
    fn test_client_errors_map_to_bad_request() {
        assert_eq!(
            DbError::invalid_json("eof").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            DbError::unknown_tool("x").status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(DbError::MissingQuery.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_database_errors_map_to_internal_server_error() {
        assert_eq!(
            DbError::connection("refused").status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            DbError::query("syntax", None).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_invalid_json_http_message_hides_parser_detail() {
        let err = DbError::invalid_json("expected value at line 1 column 1");
        assert_eq!(err.http_message(), "Invalid JSON body");
    }

    // JSON-RPC mapping

    #[test]
    fn test_missing_query_maps_to_invalid_params() {
        let rpc: RpcError = DbError::MissingQuery.into();
        assert_eq!(rpc.code, -32602);
        assert_eq!(rpc.message, "Missing query parameter");
    }

    #[test]
    fn test_unknown_tool_and_method_map_to_method_not_found() {
        let rpc: RpcError = DbError::unknown_tool("bogus").into();
        assert_eq!(rpc.code, -32601);
        assert_eq!(rpc.message, "Unknown tool: bogus");

        let rpc: RpcError = DbError::unknown_method("resources/list").into();
        assert_eq!(rpc.code, -32601);
        assert_eq!(rpc.message, "Method not found: resources/list");
    }

    #[test]
    fn test_database_errors_map_to_server_error_with_prefix() {
        let rpc: RpcError = DbError::query("You have an error in your SQL syntax", None).into();
        assert_eq!(rpc.code, -32000);
        assert_eq!(
            rpc.message,
            "Database error: You have an error in your SQL syntax"
        );

        let rpc: RpcError = DbError::connection("Connection refused").into();
        assert_eq!(rpc.code, -32000);
        assert_eq!(rpc.message, "Database error: Connection refused");
    }

    #[test]
    fn test_parse_and_internal_errors_map_to_internal_error() {
        let rpc: RpcError = DbError::invalid_json("expected value at line 1 column 1").into();
        assert_eq!(rpc.code, -32603);
        assert_eq!(rpc.message, "expected value at line 1 column 1");

        let rpc: RpcError = DbError::internal("boom").into();
        assert_eq!(rpc.code, -32603);
        assert_eq!(rpc.message, "boom");
    }

    #[test]
    fn test_non_database_sqlx_error_becomes_query_error() {
        let err: DbError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, DbError::Query { sql_state: None, .. }));
    }
}
