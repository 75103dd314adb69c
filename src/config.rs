//! Configuration handling for the MySQL bridge.
//!
//! All settings come from CLI arguments or their environment variables and
//! are read once at startup. The resulting `Config` is immutable and handed to
//! the front-ends explicitly.

use crate::models::{ConnectionConfig, DEFAULT_MYSQL_HOST, DEFAULT_MYSQL_PORT};
use clap::Parser;
use std::time::Duration;

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 3003;
pub const DEFAULT_SERVER_TYPE: &str = "http";

/// Front-end served by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransportMode {
    /// Request/response HTTP (`/status`, `/execute`)
    #[default]
    Http,
    /// Long-lived WebSocket with JSON-RPC messages
    WebSocket,
}

impl TransportMode {
    /// Select the front-end from a `SERVER_TYPE` value.
    ///
    /// Only the exact value "http" selects HTTP; anything else selects WebSocket.
    pub fn from_server_type(server_type: &str) -> Self {
        if server_type == "http" {
            Self::Http
        } else {
            Self::WebSocket
        }
    }
}

impl std::fmt::Display for TransportMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Http => write!(f, "http"),
            Self::WebSocket => write!(f, "websocket"),
        }
    }
}

/// Configuration for the MySQL bridge.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "mysql-mcp-bridge",
    about = "MySQL query bridge exposing a single mysql_query tool over HTTP or WebSocket JSON-RPC",
    version,
    author
)]
pub struct Config {
    /// Default MySQL host
    #[arg(long, default_value = DEFAULT_MYSQL_HOST, env = "MYSQL_HOST")]
    pub mysql_host: String,

    /// Default MySQL port
    #[arg(long, default_value_t = DEFAULT_MYSQL_PORT, env = "MYSQL_PORT")]
    pub mysql_port: u16,

    /// Default MySQL user
    #[arg(long, default_value = "", env = "MYSQL_USER")]
    pub mysql_user: String,

    /// Default MySQL password (never logged)
    #[arg(long, default_value = "", env = "MYSQL_PASSWORD", hide_env_values = true)]
    pub mysql_password: String,

    /// Default database; empty connects at server level
    #[arg(long, default_value = "", env = "MYSQL_DATABASE")]
    pub mysql_database: String,

    /// Address to bind the server to
    #[arg(long, default_value = DEFAULT_HOST, env = "HOST")]
    pub host: String,

    /// Port to bind the server to
    #[arg(long, default_value_t = DEFAULT_PORT, env = "PORT")]
    pub port: u16,

    /// Front-end to run: "http", anything else runs the WebSocket server
    #[arg(long, default_value = DEFAULT_SERVER_TYPE, env = "SERVER_TYPE")]
    pub server_type: String,

    /// Abort queries running longer than this many seconds (unset: no limit)
    #[arg(long, env = "QUERY_TIMEOUT")]
    pub query_timeout: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "LOG_LEVEL")]
    pub log_level: String,

    /// Enable JSON logging format
    #[arg(long, env = "LOG_JSON")]
    pub json_logs: bool,
}

impl Config {
    /// Parse configuration from command line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Create a default configuration (useful for testing).
    pub fn default_config() -> Self {
        Self {
            mysql_host: DEFAULT_MYSQL_HOST.to_string(),
            mysql_port: DEFAULT_MYSQL_PORT,
            mysql_user: String::new(),
            mysql_password: String::new(),
            mysql_database: String::new(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            server_type: DEFAULT_SERVER_TYPE.to_string(),
            query_timeout: None,
            log_level: "info".to_string(),
            json_logs: false,
        }
    }

    /// The front-end selected by `server_type`.
    pub fn transport_mode(&self) -> TransportMode {
        TransportMode::from_server_type(&self.server_type)
    }

    /// Connection used when a call carries no `db_config` override.
    pub fn default_connection(&self) -> ConnectionConfig {
        let database = Some(self.mysql_database.clone()).filter(|db| !db.is_empty());
        ConnectionConfig::new(
            &self.mysql_host,
            self.mysql_port,
            &self.mysql_user,
            &self.mysql_password,
            database,
        )
    }

    /// Get the bind address.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Get the query timeout as a Duration, if one is configured.
    ///
    /// Zero is treated as "no limit".
    pub fn query_timeout_duration(&self) -> Option<Duration> {
        self.query_timeout
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::default_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.mysql_host, "localhost");
        assert_eq!(config.mysql_port, 3306);
        assert_eq!(config.port, 3003);
        assert_eq!(config.transport_mode(), TransportMode::Http);
        assert!(config.query_timeout_duration().is_none());
    }

    #[test]
    fn test_cli_overrides() {
        let config = Config::try_parse_from([
            "mysql-mcp-bridge",
            "--mysql-host",
            "db.internal",
            "--mysql-port",
            "3307",
            "--mysql-database",
            "shop",
            "--host",
            "0.0.0.0",
            "--port",
            "9000",
            "--server-type",
            "ws",
            "--query-timeout",
            "15",
        ])
        .unwrap();
        assert_eq!(config.bind_addr(), "0.0.0.0:9000");
        assert_eq!(config.transport_mode(), TransportMode::WebSocket);
        assert_eq!(config.query_timeout_duration(), Some(Duration::from_secs(15)));

        let connection = config.default_connection();
        assert_eq!(connection.address(), "db.internal:3307");
        assert_eq!(connection.database.as_deref(), Some("shop"));
    }

    #[test]
    fn test_server_type_selection() {
        assert_eq!(TransportMode::from_server_type("http"), TransportMode::Http);
        assert_eq!(TransportMode::from_server_type("websocket"), TransportMode::WebSocket);
        assert_eq!(TransportMode::from_server_type("HTTP"), TransportMode::WebSocket);
        assert_eq!(TransportMode::from_server_type(""), TransportMode::WebSocket);
    }

    #[test]
    fn test_default_connection_omits_empty_database() {
        let config = Config {
            mysql_user: "app".to_string(),
            mysql_password: "secret".to_string(),
            ..Config::default()
        };
        let connection = config.default_connection();
        assert_eq!(connection.user, "app");
        assert_eq!(connection.password, "secret");
        assert!(connection.database.is_none());
    }

    #[test]
    fn test_zero_timeout_means_no_limit() {
        let config = Config {
            query_timeout: Some(0),
            ..Config::default()
        };
        assert!(config.query_timeout_duration().is_none());
    }
}
