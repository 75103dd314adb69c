//! Database access layer.
//!
//! This module provides:
//! - The connection factory (one connection per call, no pooling)
//! - Query execution on a single connection
//! - MySQL to JSON type mappings

pub mod connector;
pub mod executor;
pub mod types;

pub use connector::{Connector, MySqlConnector, QueryConnection};
pub use executor::QueryExecutor;
