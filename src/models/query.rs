//! Query-related data models.
//!
//! Request and response bodies of the `mysql_query` tool, shared by the HTTP
//! and WebSocket front-ends.

use crate::models::ConnectionConfig;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value as JsonValue;

/// One result row: column name to value.
pub type Row = serde_json::Map<String, JsonValue>;

/// Arguments of the `mysql_query` tool.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QueryParameters {
    /// SQL to execute as-is
    #[serde(default)]
    pub query: Option<String>,
    /// Replaces the default connection configuration when present
    #[serde(default)]
    pub db_config: Option<ConnectionConfig>,
}

impl QueryParameters {
    /// Create parameters for a query against the default connection.
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: Some(query.into()),
            db_config: None,
        }
    }

    /// Use an explicit connection configuration for this call.
    pub fn with_db_config(mut self, db_config: ConnectionConfig) -> Self {
        self.db_config = Some(db_config);
        self
    }

    /// The SQL text, if one was given. An empty string counts as missing.
    pub fn sql(&self) -> Option<&str> {
        self.query.as_deref().filter(|q| !q.is_empty())
    }
}

/// Body of `POST /execute`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExecuteRequest {
    /// Any JSON value; only the string "mysql_query" names a tool
    #[serde(default, deserialize_with = "present")]
    pub tool: Option<JsonValue>,
    #[serde(default)]
    pub parameters: Option<QueryParameters>,
}

/// Keep an explicit `null` as `Some(Null)`; only an absent field is `None`.
pub(crate) fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<JsonValue>, D::Error> {
    JsonValue::deserialize(deserializer).map(Some)
}

/// Render a tool or method name for an error message: strings verbatim, an
/// absent value as `undefined`, anything else as its JSON text.
pub fn display_name(value: Option<&JsonValue>) -> String {
    match value {
        None => "undefined".to_string(),
        Some(JsonValue::String(name)) => name.clone(),
        Some(other) => other.to_string(),
    }
}

/// Summary of a statement that produced no result set (DDL, DML).
///
/// Field names follow the MySQL OK packet as clients usually expose it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatementSummary {
    pub field_count: u32,
    pub affected_rows: u64,
    pub insert_id: u64,
}

/// Result of one executed SQL string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowSet {
    /// Rows of a result set, possibly empty
    Rows(Vec<Row>),
    /// Statement without a result set
    Summary(StatementSummary),
}

impl RowSet {
    /// Number of rows returned (or affected, for statements without rows).
    pub fn len(&self) -> u64 {
        match self {
            Self::Rows(rows) => rows.len() as u64,
            Self::Summary(summary) => summary.affected_rows,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Rows of a result set, if this is one.
    pub fn rows(&self) -> Option<&[Row]> {
        match self {
            Self::Rows(rows) => Some(rows),
            Self::Summary(_) => None,
        }
    }
}

/// Successful `mysql_query` result, on both transports.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteResponse {
    pub results: RowSet,
}

/// HTTP error body.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub tools: Vec<&'static str>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_query_counts_as_missing() {
        let params: QueryParameters = serde_json::from_str(r#"{"query":""}"#).unwrap();
        assert!(params.sql().is_none());

        let params: QueryParameters = serde_json::from_str("{}").unwrap();
        assert!(params.sql().is_none());

        let params = QueryParameters::new("SELECT 1");
        assert_eq!(params.sql(), Some("SELECT 1"));
    }

    #[test]
    fn test_execute_request_with_override() {
        let body: ExecuteRequest = serde_json::from_value(json!({
            "tool": "mysql_query",
            "parameters": {
                "query": "SELECT 1",
                "db_config": {"host": "db", "user": "app", "password": "pw"}
            }
        }))
        .unwrap();
        assert_eq!(body.tool, Some(json!("mysql_query")));
        let params = body.parameters.unwrap();
        let config = params.db_config.unwrap();
        assert_eq!(config.host, "db");
        assert_eq!(config.port, 3306);
    }

    #[test]
    fn test_tool_name_rendering() {
        let body: ExecuteRequest = serde_json::from_str(r#"{"tool": null}"#).unwrap();
        assert_eq!(display_name(body.tool.as_ref()), "null");

        let body: ExecuteRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(display_name(body.tool.as_ref()), "undefined");

        assert_eq!(display_name(Some(&json!(5))), "5");
        assert_eq!(display_name(Some(&json!("bogus"))), "bogus");
        assert_eq!(display_name(Some(&json!(true))), "true");
    }

    #[test]
    fn test_rows_serialize_as_plain_array() {
        let mut row = Row::new();
        row.insert("x".to_string(), json!(1));
        let response = ExecuteResponse {
            results: RowSet::Rows(vec![row]),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({"results": [{"x": 1}]})
        );
    }

    #[test]
    fn test_summary_serializes_like_ok_packet() {
        let results = RowSet::Summary(StatementSummary {
            field_count: 0,
            affected_rows: 3,
            insert_id: 42,
        });
        assert_eq!(
            serde_json::to_value(&results).unwrap(),
            json!({"fieldCount": 0, "affectedRows": 3, "insertId": 42})
        );
        assert_eq!(results.len(), 3);
        assert!(results.rows().is_none());
    }

    #[test]
    fn test_status_response_shape() {
        let status = StatusResponse {
            status: "running",
            kind: "mysql",
            tools: vec!["mysql_query"],
        };
        assert_eq!(
            serde_json::to_value(&status).unwrap(),
            json!({"status": "running", "type": "mysql", "tools": ["mysql_query"]})
        );
    }
}
