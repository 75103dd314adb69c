//! JSON-RPC protocol integration.
//!
//! This module maps the `initialize`, `tools/list` and `tools/call` methods onto
//! the bridge's tool handlers.

pub mod service;

pub use service::{BridgeService, SERVER_NAME, SERVER_VERSION};
