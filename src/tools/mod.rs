//! Tool implementations exposed by the bridge.
//!
//! There is a single tool, `mysql_query`. Both front-ends list it from the
//! catalog here and run it through `QueryToolHandler`.

pub mod query;

pub use query::QueryToolHandler;

use serde_json::{Value as JsonValue, json};

/// Name of the only tool the bridge exposes.
pub const MYSQL_QUERY_TOOL: &str = "mysql_query";

/// Tool names, as reported by `GET /status`.
pub fn tool_names() -> Vec<&'static str> {
    vec![MYSQL_QUERY_TOOL]
}

/// Tool descriptions, as returned by `tools/list`.
pub fn tool_descriptions() -> JsonValue {
    json!([
        {
            "name": MYSQL_QUERY_TOOL,
            "description": "Execute a SQL query on MySQL database",
            "parameters": {
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "SQL query to execute"
                    },
                    "db_config": {
                        "type": "object",
                        "description": "Optional database configuration",
                        "properties": {
                            "host": { "type": "string", "description": "Database host" },
                            "port": { "type": "integer", "description": "Database port" },
                            "user": { "type": "string", "description": "Database user" },
                            "password": { "type": "string", "description": "Database password" },
                            "database": { "type": "string", "description": "Database name" }
                        }
                    }
                },
                "required": ["query"]
            }
        }
    ])
}
