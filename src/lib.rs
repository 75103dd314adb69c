//! MySQL MCP Bridge Library
//!
//! This library exposes a single `mysql_query` tool that runs SQL against a
//! MySQL server, served either over plain HTTP or as JSON-RPC over WebSocket.

pub mod config;
pub mod db;
pub mod error;
pub mod mcp;
pub mod models;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::DbError;
pub use mcp::BridgeService;
