//! The `mysql_query` tool.
//!
//! Each call opens a fresh connection (from the `db_config` override when one
//! is given, otherwise from the process defaults), executes the SQL string
//! once, closes the connection and returns the rows.

use crate::db::{Connector, QueryConnection, QueryExecutor};
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionConfig, QueryParameters, RowSet, display_name};
use crate::tools::MYSQL_QUERY_TOOL;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Tool handler for `mysql_query`.
pub struct QueryToolHandler<C> {
    connector: Arc<C>,
    defaults: Arc<ConnectionConfig>,
    executor: QueryExecutor,
}

impl<C> Clone for QueryToolHandler<C> {
    fn clone(&self) -> Self {
        Self {
            connector: self.connector.clone(),
            defaults: self.defaults.clone(),
            executor: self.executor,
        }
    }
}

impl<C: Connector> QueryToolHandler<C> {
    /// Create a new handler.
    ///
    /// # Arguments
    ///
    /// * `connector` - Opens one connection per call
    /// * `defaults` - Connection used when a call carries no `db_config`
    /// * `executor` - Runs the SQL on the opened connection
    pub fn new(connector: Arc<C>, defaults: ConnectionConfig, executor: QueryExecutor) -> Self {
        Self {
            connector,
            defaults: Arc::new(defaults),
            executor,
        }
    }

    /// The default connection configuration.
    pub fn defaults(&self) -> &ConnectionConfig {
        &self.defaults
    }

    /// Validate the tool name, then run the query.
    ///
    /// The tool name is checked before the parameters, so an unknown tool is
    /// reported even when the query is missing too.
    pub async fn call(
        &self,
        tool: Option<&JsonValue>,
        params: Option<QueryParameters>,
    ) -> DbResult<RowSet> {
        if tool.and_then(JsonValue::as_str) != Some(MYSQL_QUERY_TOOL) {
            return Err(DbError::unknown_tool(display_name(tool)));
        }
        self.run(&params.unwrap_or_default()).await
    }

    /// Run a query: connect, execute once, close.
    ///
    /// A missing or empty query fails before any connection is attempted.
    pub async fn run(&self, params: &QueryParameters) -> DbResult<RowSet> {
        let sql = params.sql().ok_or(DbError::MissingQuery)?;
        let config = params.db_config.as_ref().unwrap_or(self.defaults.as_ref());
        let start = Instant::now();

        let mut conn = self.connector.connect(config).await?;
        let result = self.executor.execute(&mut conn, sql).await;

        if let Err(e) = conn.close().await {
            // The query outcome is what the caller gets either way
            warn!(error = %e, address = %config.address(), "Failed to close connection");
        }

        let execution_time_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(rows) => info!(
                address = %config.address(),
                override_config = params.db_config.is_some(),
                rows = rows.len(),
                execution_time_ms,
                "Query executed"
            ),
            Err(e) => warn!(
                address = %config.address(),
                override_config = params.db_config.is_some(),
                sql_state = e.sql_state(),
                error = %e,
                "Query failed"
            ),
        }
        result
    }

    /// Open and immediately close a connection with the default configuration.
    pub async fn probe(&self) -> DbResult<()> {
        debug!(address = %self.defaults.address(), "Probing default connection");
        let conn = self.connector.connect(&self.defaults).await?;
        conn.close().await
    }
}
