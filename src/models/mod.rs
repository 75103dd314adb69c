//! Data models for the MySQL bridge.
//!
//! This module re-exports all wire and configuration types used by the
//! front-ends and the database layer.

pub mod connection;
pub mod query;
pub mod rpc;

// Re-export commonly used types
pub use connection::{ConnectionConfig, DEFAULT_MYSQL_HOST, DEFAULT_MYSQL_PORT};
pub use query::{
    ErrorBody, ExecuteRequest, ExecuteResponse, QueryParameters, Row, RowSet, StatementSummary,
    StatusResponse, display_name,
};
pub use rpc::{
    InitializeResult, JSONRPC_VERSION, ProbeStatus, RpcError, RpcMethod, RpcOutcome, RpcRequest,
    RpcResponse, ServerConfigInfo, ToolCallParams, rpc_codes,
};
