//! Query execution.
//!
//! The executor runs one SQL string on a connection it is handed. It does not
//! open or close connections; the caller owns that lifecycle.

use crate::db::connector::QueryConnection;
use crate::error::{DbError, DbResult};
use crate::models::RowSet;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, warn};

/// Query executor that handles SQL execution on a single connection.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryExecutor {
    query_timeout: Option<Duration>,
}

impl QueryExecutor {
    /// Create an executor without a time limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an executor that aborts queries running longer than `query_timeout`.
    pub fn with_timeout(query_timeout: Option<Duration>) -> Self {
        Self { query_timeout }
    }

    pub fn query_timeout(&self) -> Option<Duration> {
        self.query_timeout
    }

    /// Execute `sql` unmodified and return the resulting rows.
    pub async fn execute<C: QueryConnection>(&self, conn: &mut C, sql: &str) -> DbResult<RowSet> {
        let start = Instant::now();
        debug!(
            sql = %sql,
            timeout_secs = ?self.query_timeout.map(|t| t.as_secs()),
            "Executing query"
        );

        let result = match self.query_timeout {
            Some(limit) => match timeout(limit, conn.query(sql)).await {
                Ok(result) => result,
                Err(_) => {
                    warn!(timeout_secs = limit.as_secs(), "Query timed out");
                    Err(DbError::timeout("query execution", limit.as_secs()))
                }
            },
            None => conn.query(sql).await,
        };

        let execution_time_ms = start.elapsed().as_millis() as u64;
        match &result {
            Ok(rows) => debug!(rows = rows.len(), execution_time_ms, "Query finished"),
            Err(e) => debug!(error = %e, execution_time_ms, "Query failed"),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Row;

    struct SleepyConnection {
        delay: Duration,
    }

    impl QueryConnection for SleepyConnection {
        async fn query(&mut self, _sql: &str) -> DbResult<RowSet> {
            tokio::time::sleep(self.delay).await;
            Ok(RowSet::Rows(vec![Row::new()]))
        }

        async fn close(self) -> DbResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_executor_defaults() {
        assert!(QueryExecutor::new().query_timeout().is_none());
        assert_eq!(
            QueryExecutor::with_timeout(Some(Duration::from_secs(5))).query_timeout(),
            Some(Duration::from_secs(5))
        );
    }

    #[tokio::test]
    async fn test_execute_without_timeout() {
        let mut conn = SleepyConnection {
            delay: Duration::from_millis(10),
        };
        let rows = QueryExecutor::new().execute(&mut conn, "SELECT 1").await.unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_times_out() {
        let mut conn = SleepyConnection {
            delay: Duration::from_secs(5),
        };
        let executor = QueryExecutor::with_timeout(Some(Duration::from_millis(20)));
        let err = executor.execute(&mut conn, "SELECT SLEEP(5)").await.unwrap_err();
        assert!(matches!(err, DbError::Timeout { .. }));
    }
}
