//! WebSocket front-end.
//!
//! Accepts upgrades on any path. Each inbound text frame is one JSON-RPC
//! message answered by exactly one outbound text frame. Messages on a socket
//! are handled concurrently, so responses may arrive out of order and are
//! correlated by `id` only.

use crate::db::Connector;
use crate::error::DbResult;
use crate::mcp::BridgeService;
use crate::transport::{Transport, bind, serve};
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{ConnectInfo, State};
use axum::response::Response;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// WebSocket transport implementation.
pub struct WebSocketTransport<C> {
    service: BridgeService<C>,
    bind_addr: String,
}

impl<C: Connector> WebSocketTransport<C> {
    /// Create a new WebSocket transport.
    pub fn new(service: BridgeService<C>, bind_addr: impl Into<String>) -> Self {
        Self {
            service,
            bind_addr: bind_addr.into(),
        }
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn run_on(&self, listener: tokio::net::TcpListener) -> DbResult<()> {
        serve(listener, router(self.service.clone()), self.name()).await
    }
}

impl<C: Connector> Transport for WebSocketTransport<C> {
    async fn run(&self) -> DbResult<()> {
        info!(
            "Starting MySQL bridge with WebSocket transport on {}",
            self.bind_addr
        );
        let listener = bind(&self.bind_addr).await?;
        info!("WebSocket server listening on ws://{}", self.bind_addr);
        self.run_on(listener).await
    }

    fn name(&self) -> &'static str {
        "websocket"
    }
}

/// Build the WebSocket application.
///
/// Must be served with `into_make_service_with_connect_info::<SocketAddr>()`.
pub fn router<C: Connector>(service: BridgeService<C>) -> Router {
    Router::new()
        .fallback(upgrade::<C>)
        .with_state(service)
}

async fn upgrade<C: Connector>(
    ws: WebSocketUpgrade,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    State(service): State<BridgeService<C>>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, peer, service))
}

async fn handle_socket<C: Connector>(socket: WebSocket, peer: SocketAddr, service: BridgeService<C>) {
    info!(%peer, "Client connected");

    let (mut sender, mut receiver) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();

    // Single writer: per-message tasks only ever touch the channel
    let writer = tokio::spawn(async move {
        while let Some(text) = rx.recv().await {
            if let Err(e) = sender.send(Message::Text(text.into())).await {
                warn!(%peer, error = %e, "Failed to send response");
                break;
            }
        }
    });

    while let Some(frame) = receiver.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.as_str().to_owned(),
            Ok(Message::Binary(bytes)) => String::from_utf8_lossy(&bytes).into_owned(),
            Ok(Message::Close(_)) => break,
            Ok(_) => continue,
            Err(e) => {
                warn!(%peer, error = %e, "WebSocket error");
                break;
            }
        };

        debug!(%peer, len = text.len(), "Received message");
        let service = service.clone();
        let tx = tx.clone();
        tokio::spawn(async move {
            let response = service.handle_message(&text).await;
            // A closed channel means the socket is gone; the response is dropped
            let _ = tx.send(response.to_json());
        });
    }

    drop(tx);
    if let Err(e) = writer.await {
        warn!(%peer, error = %e, "Writer task failed");
    }
    info!(%peer, "Client disconnected");
}
