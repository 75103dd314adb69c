//! JSON-RPC service behind the WebSocket front-end.
//!
//! `BridgeService` turns one inbound text message into one response envelope.
//! It never fails: every error, including unparseable input, becomes a
//! JSON-RPC error object.

use crate::db::Connector;
use crate::error::{DbError, DbResult};
use crate::models::{
    ExecuteResponse, InitializeResult, ProbeStatus, RpcMethod, RpcRequest, RpcResponse,
    ServerConfigInfo, ToolCallParams,
};
use crate::tools::{QueryToolHandler, tool_descriptions};
use serde_json::Value as JsonValue;
use tracing::{debug, error, warn};

/// Server name reported by `initialize`.
pub const SERVER_NAME: &str = "MySQL MCP Server";

/// Server version reported by `initialize`.
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

pub struct BridgeService<C> {
    /// Shared `mysql_query` implementation
    query_tool: QueryToolHandler<C>,
}

impl<C> Clone for BridgeService<C> {
    fn clone(&self) -> Self {
        Self {
            query_tool: self.query_tool.clone(),
        }
    }
}

impl<C: Connector> BridgeService<C> {
    /// Create a new BridgeService instance.
    pub fn new(query_tool: QueryToolHandler<C>) -> Self {
        Self { query_tool }
    }

    /// Handle one inbound message.
    pub async fn handle_message(&self, text: &str) -> RpcResponse {
        let value: JsonValue = match serde_json::from_str(text) {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Failed to parse message");
                return RpcResponse::failure(JsonValue::Null, DbError::from(e));
            }
        };

        let request = match RpcRequest::from_value(value) {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "Malformed request envelope");
                return RpcResponse::failure(JsonValue::Null, e);
            }
        };

        let id = request.id();
        let result = match request.method() {
            Ok(method) => self.dispatch(method).await,
            Err(e) => Err(e),
        };

        match result {
            Ok(result) => RpcResponse::success(id, result),
            Err(e) => {
                if e.is_client_error() {
                    warn!(error = %e, "Rejected message");
                } else {
                    error!(error = %e, "Message handling failed");
                }
                RpcResponse::failure(id, e)
            }
        }
    }

    async fn dispatch(&self, method: RpcMethod) -> DbResult<JsonValue> {
        match method {
            RpcMethod::Initialize => to_value(self.initialize().await),
            RpcMethod::ToolsList => Ok(tool_descriptions()),
            RpcMethod::ToolsCall(call) => to_value(self.tools_call(call).await?),
            RpcMethod::Unknown(method) => Err(DbError::unknown_method(method)),
        }
    }

    /// `initialize`: report identity and whether the default database is reachable.
    ///
    /// A failed probe is reported in the result, never as a JSON-RPC error.
    pub async fn initialize(&self) -> InitializeResult {
        let (mysql_connection, mysql_error) = match self.query_tool.probe().await {
            Ok(()) => (ProbeStatus::Success, None),
            Err(e) => {
                debug!(error = %e, "Default connection probe failed");
                (ProbeStatus::Failed, Some(e.to_string()))
            }
        };

        let defaults = self.query_tool.defaults();
        InitializeResult {
            name: SERVER_NAME,
            version: SERVER_VERSION,
            status: "initialized",
            mysql_connection,
            mysql_error,
            config: ServerConfigInfo {
                mysql_host: defaults.host.clone(),
                mysql_port: defaults.port,
            },
        }
    }

    /// `tools/call`: run the named tool.
    pub async fn tools_call(&self, call: ToolCallParams) -> DbResult<ExecuteResponse> {
        let results = self
            .query_tool
            .call(call.tool.as_ref(), call.params)
            .await?;
        Ok(ExecuteResponse { results })
    }
}

fn to_value<T: serde::Serialize>(value: T) -> DbResult<JsonValue> {
    serde_json::to_value(value).map_err(|e| DbError::internal(e.to_string()))
}
