//! Connection factory.
//!
//! Every tool call opens its own connection, runs one SQL string on it and
//! closes it again. There is no pool: a `ConnectionConfig` is used for exactly
//! one connection lifecycle.

use crate::db::types::RowToJson;
use crate::error::{DbError, DbResult};
use crate::models::{ConnectionConfig, Row, RowSet, StatementSummary};
use futures_util::TryStreamExt;
use sqlx::mysql::MySqlConnectOptions;
use sqlx::{Connection, Either, MySqlConnection};
use std::future::Future;
use tracing::debug;

/// Opens database connections.
///
/// The bridge talks to MySQL through `MySqlConnector`; tests plug in their own
/// implementation.
pub trait Connector: Send + Sync + 'static {
    type Connection: QueryConnection;

    /// Open a new connection described by `config`.
    ///
    /// Fails with `DbError::Connection` carrying the driver's message.
    fn connect(
        &self,
        config: &ConnectionConfig,
    ) -> impl Future<Output = DbResult<Self::Connection>> + Send;
}

/// A live connection that can run raw SQL.
pub trait QueryConnection: Send + 'static {
    /// Run `sql` exactly as given and return the driver's rows.
    fn query(&mut self, sql: &str) -> impl Future<Output = DbResult<RowSet>> + Send;

    /// Close the connection.
    fn close(self) -> impl Future<Output = DbResult<()>> + Send;
}

/// Connector backed by sqlx's MySQL driver.
#[derive(Debug, Clone, Copy, Default)]
pub struct MySqlConnector;

impl MySqlConnector {
    pub fn new() -> Self {
        Self
    }

    /// Build driver options from a connection configuration.
    ///
    /// The session keeps the server's own `sql_mode` and `time_zone`: sqlx
    /// would otherwise add `PIPES_AS_CONCAT` and `NO_ENGINE_SUBSTITUTION` and
    /// pin the zone to UTC, which changes what the caller's SQL means.
    pub fn connect_options(config: &ConnectionConfig) -> MySqlConnectOptions {
        let options = MySqlConnectOptions::new()
            .host(&config.host)
            .port(config.port)
            .username(&config.user)
            .password(&config.password)
            .pipes_as_concat(false)
            .no_engine_substitution(false)
            .timezone(None::<String>);

        match config.database.as_deref() {
            Some(database) if !database.is_empty() => options.database(database),
            _ => options,
        }
    }
}

impl Connector for MySqlConnector {
    type Connection = MySqlConnection;

    async fn connect(&self, config: &ConnectionConfig) -> DbResult<MySqlConnection> {
        debug!(
            address = %config.address(),
            user = %config.user,
            database = ?config.database,
            "Opening MySQL connection"
        );
        let options = Self::connect_options(config);
        MySqlConnection::connect_with(&options)
            .await
            .map_err(DbError::from_connect)
    }
}

impl QueryConnection for MySqlConnection {
    async fn query(&mut self, sql: &str) -> DbResult<RowSet> {
        let mut collector = ResultCollector::default();

        // raw_sql goes over the text protocol, so any statement the server
        // accepts runs, including ones that cannot be prepared
        let mut stream = sqlx::raw_sql(sql).fetch_many(&mut *self);
        while let Some(item) = stream.try_next().await? {
            match item {
                Either::Left(done) => collector.push_done(done.rows_affected(), done.last_insert_id()),
                Either::Right(row) => collector.push_row(row.to_json_map()),
            }
        }

        Ok(collector.finish(sql))
    }

    async fn close(self) -> DbResult<()> {
        Connection::close(self).await.map_err(DbError::from)
    }
}

/// Folds everything one SQL string produced into a single `RowSet`.
///
/// A string holding several statements yields the rows of all its result
/// sets concatenated in order. When no rows arrive and the string does not
/// start with a result-set statement, the statements' counts are summed into
/// one summary that keeps the last non-zero insert id.
#[derive(Debug, Default)]
pub struct ResultCollector {
    rows: Vec<Row>,
    summary: StatementSummary,
}

impl ResultCollector {
    pub fn push_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Record the completion of one statement.
    pub fn push_done(&mut self, rows_affected: u64, last_insert_id: u64) {
        self.summary.affected_rows += rows_affected;
        if last_insert_id != 0 {
            self.summary.insert_id = last_insert_id;
        }
    }

    pub fn finish(self, sql: &str) -> RowSet {
        if self.rows.is_empty() && !returns_result_set(sql) {
            RowSet::Summary(self.summary)
        } else {
            RowSet::Rows(self.rows)
        }
    }
}

/// Keywords of statements that answer with a result set even when it is empty.
const RESULT_SET_KEYWORDS: &[&str] = &[
    "select", "show", "describe", "desc", "explain", "with", "values", "table", "help",
];

/// Whether `sql` starts with a statement that produces a result set.
///
/// Used to tell an empty result set (`[]`) apart from a statement that has
/// none, since the driver reports both as zero rows.
pub fn returns_result_set(sql: &str) -> bool {
    let keyword: String = skip_leading_noise(sql)
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_lowercase();
    RESULT_SET_KEYWORDS.contains(&keyword.as_str())
}

/// Strip whitespace, opening parentheses and comments (`/* */`, `#`, `-- `)
/// in front of the first keyword.
fn skip_leading_noise(mut sql: &str) -> &str {
    loop {
        let trimmed = sql.trim_start_matches(|c: char| c.is_whitespace() || c == '(');
        if let Some(rest) = trimmed.strip_prefix("/*") {
            sql = rest.find("*/").map_or("", |end| &rest[end + 2..]);
        } else if trimmed.starts_with('#') || starts_dash_comment(trimmed) {
            sql = trimmed.find('\n').map_or("", |end| &trimmed[end + 1..]);
        } else {
            return trimmed;
        }
    }
}

/// MySQL only treats `--` as a comment when a space or control character follows.
fn starts_dash_comment(sql: &str) -> bool {
    sql.strip_prefix("--").is_some_and(|rest| {
        rest.chars()
            .next()
            .is_none_or(|c| c.is_whitespace() || c.is_control())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_set_statements() {
        assert!(returns_result_set("SELECT 1"));
        assert!(returns_result_set("  select * from t where false"));
        assert!(returns_result_set("(SELECT 1) UNION (SELECT 2)"));
        assert!(returns_result_set("SHOW TABLES"));
        assert!(returns_result_set("WITH x AS (SELECT 1) SELECT * FROM x"));
        assert!(returns_result_set("describe users"));
    }

    #[test]
    fn test_result_set_statements_after_comments() {
        assert!(returns_result_set("/* x */ SELECT * FROM t WHERE 0"));
        assert!(returns_result_set("-- c\nSELECT * FROM t WHERE 0"));
        assert!(returns_result_set("# report\n  select 1"));
        assert!(returns_result_set("/* a */ -- b\n/* c */(SELECT 1)"));
        assert!(returns_result_set("--\tnote\nSHOW TABLES"));
        assert!(!returns_result_set("/* x */ DELETE FROM t"));
        assert!(!returns_result_set("-- SELECT\nUPDATE t SET a = 1"));
        assert!(!returns_result_set("/* never closed SELECT"));
        assert!(!returns_result_set("-- only a comment"));
    }

    #[test]
    fn test_statements_without_result_set() {
        assert!(!returns_result_set("INSERT INTO t VALUES (1)"));
        assert!(!returns_result_set("UPDATE t SET a = 1"));
        assert!(!returns_result_set("CREATE TABLE t (id INT)"));
        assert!(!returns_result_set("SELECTED"));
        assert!(!returns_result_set(""));
        // `--` without a following space is an operator, not a comment
        assert!(!returns_result_set("--1\nSELECT 1"));
    }

    #[test]
    fn test_session_keeps_server_sql_mode_and_time_zone() {
        let options = MySqlConnector::connect_options(&ConnectionConfig::default());
        let debug = format!("{:?}", options);
        assert!(debug.contains("pipes_as_concat: false"), "{}", debug);
        assert!(debug.contains("no_engine_substitution: false"), "{}", debug);
        assert!(debug.contains("timezone: None"), "{}", debug);
    }

    fn row(column: &str, value: i64) -> Row {
        let mut row = Row::new();
        row.insert(column.to_string(), value.into());
        row
    }

    #[test]
    fn test_collector_concatenates_result_sets() {
        let mut collector = ResultCollector::default();
        collector.push_row(row("a", 1));
        collector.push_done(0, 0);
        collector.push_row(row("b", 2));
        collector.push_done(0, 0);

        match collector.finish("SELECT 1 AS a; SELECT 2 AS b") {
            RowSet::Rows(rows) => assert_eq!(rows, vec![row("a", 1), row("b", 2)]),
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_collector_sums_statement_counts() {
        let mut collector = ResultCollector::default();
        collector.push_done(2, 7);
        collector.push_done(3, 0);

        assert_eq!(
            collector.finish("INSERT INTO t VALUES (1), (2); UPDATE t SET a = 0"),
            RowSet::Summary(StatementSummary {
                field_count: 0,
                affected_rows: 5,
                insert_id: 7,
            })
        );
    }

    #[test]
    fn test_collector_empty_select_is_empty_rows() {
        let mut collector = ResultCollector::default();
        collector.push_done(0, 0);
        assert_eq!(collector.finish("/* x */ SELECT * FROM t WHERE 0"), RowSet::Rows(Vec::new()));
    }

    #[test]
    fn test_connector_is_stateless() {
        let connector = MySqlConnector::new();
        let copy = connector;
        assert_eq!(format!("{:?}", copy), "MySqlConnector");
    }
}
