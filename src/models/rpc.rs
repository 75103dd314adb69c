//! JSON-RPC envelope types for the WebSocket front-end.

use crate::error::{DbError, DbResult};
use crate::models::QueryParameters;
use crate::models::query::{display_name, present};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC error codes used by the bridge.
pub mod rpc_codes {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const INTERNAL_ERROR: i32 = -32603;
    /// Database failure (implementation-defined server error range)
    pub const SERVER_ERROR: i32 = -32000;
}

/// Inbound request envelope. Fields are untyped JSON: `jsonrpc` is never
/// checked and a `method` of any type is answered with "Method not found".
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RpcRequest {
    #[serde(default)]
    pub jsonrpc: Option<JsonValue>,
    #[serde(default, deserialize_with = "present")]
    pub method: Option<JsonValue>,
    #[serde(default)]
    pub params: Option<JsonValue>,
    #[serde(default)]
    pub id: Option<JsonValue>,
}

impl RpcRequest {
    /// Take the envelope fields out of a parsed message.
    ///
    /// Any non-object value other than `null` carries no fields and yields an
    /// empty request; `null` cannot be read at all.
    pub fn from_value(value: JsonValue) -> DbResult<Self> {
        match value {
            JsonValue::Object(mut fields) => Ok(Self {
                jsonrpc: fields.remove("jsonrpc"),
                method: fields.remove("method"),
                params: fields.remove("params"),
                id: fields.remove("id"),
            }),
            JsonValue::Null => Err(DbError::internal("Cannot read request fields of null")),
            _ => Ok(Self::default()),
        }
    }

    /// The request id, or null when absent.
    pub fn id(&self) -> JsonValue {
        self.id.clone().unwrap_or(JsonValue::Null)
    }

    /// Resolve the method name into a typed call.
    pub fn method(&self) -> DbResult<RpcMethod> {
        match self.method.as_ref().and_then(JsonValue::as_str) {
            Some("initialize") => Ok(RpcMethod::Initialize),
            Some("tools/list") => Ok(RpcMethod::ToolsList),
            Some("tools/call") => {
                let params = match &self.params {
                    None | Some(JsonValue::Null) => ToolCallParams::default(),
                    Some(value) => ToolCallParams::deserialize(value)
                        .map_err(|e| DbError::internal(format!("Invalid tools/call params: {}", e)))?,
                };
                Ok(RpcMethod::ToolsCall(params))
            }
            _ => Ok(RpcMethod::Unknown(display_name(self.method.as_ref()))),
        }
    }
}

/// Methods understood by the WebSocket front-end.
#[derive(Debug, Clone)]
pub enum RpcMethod {
    Initialize,
    ToolsList,
    ToolsCall(ToolCallParams),
    Unknown(String),
}

/// `params` of a `tools/call` request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolCallParams {
    #[serde(default, deserialize_with = "present")]
    pub tool: Option<JsonValue>,
    #[serde(default)]
    pub params: Option<QueryParameters>,
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub message: String,
}

impl RpcError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RpcOutcome {
    Result(JsonValue),
    Error(RpcError),
}

/// Outbound response envelope: `{jsonrpc, result | error, id}`.
#[derive(Debug, Clone, Serialize)]
pub struct RpcResponse {
    pub jsonrpc: &'static str,
    #[serde(flatten)]
    pub outcome: RpcOutcome,
    pub id: JsonValue,
}

impl RpcResponse {
    pub fn success(id: JsonValue, result: JsonValue) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            outcome: RpcOutcome::Result(result),
            id,
        }
    }

    pub fn failure(id: JsonValue, error: impl Into<RpcError>) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION,
            outcome: RpcOutcome::Error(error.into()),
            id,
        }
    }

    /// Serialize to the text frame sent on the socket.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            // Only reachable with non-string map keys, which the bridge never builds
            format!(
                r#"{{"jsonrpc":"2.0","error":{{"code":{},"message":"{}"}},"id":null}}"#,
                rpc_codes::INTERNAL_ERROR,
                e.to_string().replace('"', "'")
            )
        })
    }
}

/// Result of the `initialize` method.
#[derive(Debug, Clone, Serialize)]
pub struct InitializeResult {
    pub name: &'static str,
    pub version: &'static str,
    pub status: &'static str,
    pub mysql_connection: ProbeStatus,
    pub mysql_error: Option<String>,
    pub config: ServerConfigInfo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProbeStatus {
    Success,
    Failed,
}

/// Default connection target echoed by `initialize` (no credentials).
#[derive(Debug, Clone, Serialize)]
pub struct ServerConfigInfo {
    pub mysql_host: String,
    pub mysql_port: u16,
}
