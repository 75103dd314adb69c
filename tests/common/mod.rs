//! Shared fixtures: an in-memory connector standing in for MySQL.

#![allow(dead_code)]

use mysql_mcp_bridge::db::{Connector, QueryConnection, QueryExecutor};
use mysql_mcp_bridge::error::{DbError, DbResult};
use mysql_mcp_bridge::models::{ConnectionConfig, Row, RowSet, StatementSummary};
use mysql_mcp_bridge::tools::QueryToolHandler;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Canned answers keyed on the SQL text:
/// - `SELECT 1 AS x` returns `[{"x": 1}]`
/// - `SELECT SLEEP(n)` waits n * 100ms, then returns `[{"slept": n}]`
/// - `SELECT * FROM empty` returns `[]`
/// - `INSERT ...` returns an OK summary with one affected row and insert id 42
/// - `BROKEN ...` fails with a syntax error
/// - anything else echoes the SQL back as `[{"sql": ...}]`
#[derive(Default)]
pub struct FakeConnector {
    pub configs: Mutex<Vec<ConnectionConfig>>,
    pub queries: Arc<Mutex<Vec<String>>>,
    pub closed: Arc<AtomicUsize>,
    /// When set, every connection attempt fails with this message
    pub refuse: Option<String>,
}

impl FakeConnector {
    pub fn refusing(message: &str) -> Self {
        Self {
            refuse: Some(message.to_string()),
            ..Default::default()
        }
    }

    pub fn connect_count(&self) -> usize {
        self.configs.lock().unwrap().len()
    }

    pub fn last_config(&self) -> Option<ConnectionConfig> {
        self.configs.lock().unwrap().last().cloned()
    }

    pub fn close_count(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

pub struct FakeConnection {
    queries: Arc<Mutex<Vec<String>>>,
    closed: Arc<AtomicUsize>,
}

impl Connector for FakeConnector {
    type Connection = FakeConnection;

    async fn connect(&self, config: &ConnectionConfig) -> DbResult<FakeConnection> {
        self.configs.lock().unwrap().push(config.clone());
        if let Some(message) = &self.refuse {
            return Err(DbError::connection(message.clone()));
        }
        Ok(FakeConnection {
            queries: self.queries.clone(),
            closed: self.closed.clone(),
        })
    }
}

impl QueryConnection for FakeConnection {
    async fn query(&mut self, sql: &str) -> DbResult<RowSet> {
        self.queries.lock().unwrap().push(sql.to_string());

        if sql == "SELECT 1 AS x" {
            return Ok(RowSet::Rows(vec![row("x", json!(1))]));
        }
        if let Some(n) = sql
            .strip_prefix("SELECT SLEEP(")
            .and_then(|rest| rest.strip_suffix(')'))
            .and_then(|n| n.parse::<u64>().ok())
        {
            tokio::time::sleep(Duration::from_millis(n * 100)).await;
            return Ok(RowSet::Rows(vec![row("slept", json!(n))]));
        }
        if sql == "SELECT * FROM empty" {
            return Ok(RowSet::Rows(Vec::new()));
        }
        if sql.starts_with("INSERT") {
            return Ok(RowSet::Summary(StatementSummary {
                field_count: 0,
                affected_rows: 1,
                insert_id: 42,
            }));
        }
        if sql.starts_with("BROKEN") {
            return Err(DbError::query(
                "You have an error in your SQL syntax; check the manual that corresponds to your MySQL server version",
                Some("42000".to_string()),
            ));
        }
        Ok(RowSet::Rows(vec![row("sql", json!(sql))]))
    }

    async fn close(self) -> DbResult<()> {
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn row(column: &str, value: serde_json::Value) -> Row {
    let mut row = Row::new();
    row.insert(column.to_string(), value);
    row
}

/// Defaults a process would read from the MYSQL_* variables.
pub fn default_connection() -> ConnectionConfig {
    ConnectionConfig::new("mysql.test", 3306, "bridge", "s3cret", Some("app".to_string()))
}

/// Build a tool handler over `connector`, returning both.
pub fn query_tool(connector: FakeConnector) -> (QueryToolHandler<FakeConnector>, Arc<FakeConnector>) {
    let connector = Arc::new(connector);
    let handler = QueryToolHandler::new(connector.clone(), default_connection(), QueryExecutor::new());
    (handler, connector)
}
