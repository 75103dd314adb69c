//! Transport layer for the bridge.
//!
//! Two alternative front-ends serve the same `mysql_query` tool:
//! - HTTP: one-shot `GET /status` and `POST /execute`
//! - WebSocket: long-lived sockets carrying JSON-RPC messages

pub mod http;
pub mod websocket;

pub use http::HttpTransport;
pub use websocket::WebSocketTransport;

use crate::error::{DbError, DbResult};
use axum::Router;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;
use tracing::{error, info, warn};

/// Grace period for open connections once shutdown has been requested.
pub const GRACEFUL_TIMEOUT: Duration = Duration::from_secs(30);

/// Trait for front-end implementations.
pub trait Transport: Send + Sync {
    /// Start the transport and begin handling requests.
    ///
    /// This method should block until the transport is shut down.
    fn run(&self) -> impl Future<Output = DbResult<()>> + Send;

    /// Get the name of this transport for logging.
    fn name(&self) -> &'static str;
}

/// Bind a TCP listener, mapping failures to a bridge error.
pub async fn bind(bind_addr: &str) -> DbResult<TcpListener> {
    TcpListener::bind(bind_addr)
        .await
        .map_err(|e| DbError::internal(format!("Failed to bind to {}: {}", bind_addr, e)))
}

/// Serve `app` on `listener` until SIGINT or SIGTERM.
///
/// Open WebSocket connections may keep the server alive indefinitely, so after
/// the first signal the server gets `GRACEFUL_TIMEOUT` to drain; a second
/// signal exits immediately.
pub async fn serve(listener: TcpListener, app: Router, name: &'static str) -> DbResult<()> {
    let shutdown_notify = Arc::new(tokio::sync::Notify::new());
    let shutdown_notify_clone = shutdown_notify.clone();

    let shutdown_signal = async move {
        wait_for_signal().await;
        shutdown_notify_clone.notify_one();
    };

    let server = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal);

    tokio::select! {
        result = server => {
            match result {
                Ok(()) => info!(transport = name, "Server stopped"),
                Err(e) => {
                    error!(transport = name, error = %e, "Server error");
                    return Err(DbError::internal(format!("{} server error: {}", name, e)));
                }
            }
        }
        _ = async {
            shutdown_notify.notified().await;
            info!(
                timeout_secs = GRACEFUL_TIMEOUT.as_secs(),
                "Waiting for connections to close (send signal again to force exit)..."
            );

            tokio::select! {
                _ = tokio::time::sleep(GRACEFUL_TIMEOUT) => {
                    warn!("Graceful shutdown timeout, forcing exit");
                }
                _ = wait_for_signal() => {
                    warn!("Received second signal, forcing immediate exit");
                }
            }
        } => {}
    }

    Ok(())
}

/// Wait for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received SIGINT"),
        _ = terminate => info!("Received SIGTERM"),
    }
}
