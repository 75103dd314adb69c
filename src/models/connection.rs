//! Connection-related data models.
//!
//! A `ConnectionConfig` describes one MySQL connection. It is built either from
//! the process defaults or from a per-call `db_config` override, and is used for
//! exactly one connect / query / close cycle.

use serde::Deserialize;

/// Default MySQL host when an override omits it.
pub const DEFAULT_MYSQL_HOST: &str = "localhost";

/// Default MySQL port.
pub const DEFAULT_MYSQL_PORT: u16 = 3306;

fn default_host() -> String {
    DEFAULT_MYSQL_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_MYSQL_PORT
}

/// Configuration for a single database connection.
///
/// When it arrives as a `db_config` override, missing fields fall back to the
/// driver defaults (not to the process defaults): the override always replaces
/// the whole configuration.
#[derive(Clone, PartialEq, Eq, Deserialize)]
pub struct ConnectionConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default)]
    pub user: String,
    /// Sensitive - never log
    #[serde(default)]
    pub password: String,
    /// Database to select after connecting. None connects at server level.
    #[serde(default)]
    pub database: Option<String>,
}

impl ConnectionConfig {
    /// Create a new connection configuration.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        user: impl Into<String>,
        password: impl Into<String>,
        database: Option<String>,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            user: user.into(),
            password: password.into(),
            database: database.filter(|db| !db.is_empty()),
        }
    }

    /// `host:port` for log lines.
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self::new(DEFAULT_MYSQL_HOST, DEFAULT_MYSQL_PORT, "", "", None)
    }
}

impl std::fmt::Debug for ConnectionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConnectionConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"****")
            .field("database", &self.database)
            .finish()
    }
}
