//! MySQL MCP Bridge - Main entry point.
//!
//! Reads its settings from the environment, then serves the `mysql_query`
//! tool over HTTP or WebSocket depending on `SERVER_TYPE`.

use mysql_mcp_bridge::config::{Config, TransportMode};
use mysql_mcp_bridge::db::{MySqlConnector, QueryExecutor};
use mysql_mcp_bridge::mcp::BridgeService;
use mysql_mcp_bridge::tools::QueryToolHandler;
use mysql_mcp_bridge::transport::{HttpTransport, Transport, WebSocketTransport};
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Initialize the tracing subscriber for logging.
fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let subscriber = tracing_subscriber::registry().with(filter);

    if config.json_logs {
        subscriber
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        subscriber
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Parse configuration from command line and environment
    let config = Config::parse_args();

    // Initialize logging
    init_tracing(&config);

    let transport = config.transport_mode();
    info!(
        %transport,
        "Starting MySQL MCP Bridge v{}",
        env!("CARGO_PKG_VERSION")
    );

    let defaults = config.default_connection();
    info!(
        host = %defaults.host,
        port = defaults.port,
        user = %defaults.user,
        database = defaults.database.as_deref().unwrap_or(""),
        "MySQL configuration"
    );

    let executor = QueryExecutor::with_timeout(config.query_timeout_duration());
    if let Some(timeout) = executor.query_timeout() {
        info!(timeout_secs = timeout.as_secs(), "Query timeout enabled");
    }

    let query_tool = QueryToolHandler::new(Arc::new(MySqlConnector::new()), defaults, executor);
    let bind_addr = config.bind_addr();

    // Run the selected transport
    let result = match transport {
        TransportMode::Http => HttpTransport::new(query_tool, bind_addr).run().await,
        TransportMode::WebSocket => {
            WebSocketTransport::new(BridgeService::new(query_tool), bind_addr)
                .run()
                .await
        }
    };

    if let Err(e) = result {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}
