//! HTTP front-end.
//!
//! Serves `GET /status` and `POST /execute`. Every response, errors and
//! preflights included, carries permissive CORS headers.

use crate::db::Connector;
use crate::error::{DbError, DbResult};
use crate::models::{ErrorBody, ExecuteRequest, ExecuteResponse, StatusResponse};
use crate::tools::{QueryToolHandler, tool_names};
use crate::transport::{Transport, bind, serve};
use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Request, State};
use axum::http::{HeaderValue, Method, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::Value as JsonValue;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

const ALLOW_ORIGIN: &str = "*";
const ALLOW_METHODS: &str = "GET, POST, OPTIONS";
const ALLOW_HEADERS: &str = "Content-Type";

/// HTTP transport implementation.
pub struct HttpTransport<C> {
    query_tool: QueryToolHandler<C>,
    bind_addr: String,
}

impl<C: Connector> HttpTransport<C> {
    /// Create a new HTTP transport.
    ///
    /// # Arguments
    ///
    /// * `query_tool` - Shared `mysql_query` implementation
    /// * `bind_addr` - Address to listen on, e.g. "0.0.0.0:3003"
    pub fn new(query_tool: QueryToolHandler<C>, bind_addr: impl Into<String>) -> Self {
        Self {
            query_tool,
            bind_addr: bind_addr.into(),
        }
    }

    /// Serve on an already bound listener until shutdown.
    pub async fn run_on(&self, listener: tokio::net::TcpListener) -> DbResult<()> {
        serve(listener, router(self.query_tool.clone()), self.name()).await
    }
}

impl<C: Connector> Transport for HttpTransport<C> {
    async fn run(&self) -> DbResult<()> {
        info!("Starting MySQL bridge with HTTP transport on {}", self.bind_addr);
        let listener = bind(&self.bind_addr).await?;
        info!(
            "HTTP server listening on http://{}  (GET /status, POST /execute)",
            self.bind_addr
        );
        self.run_on(listener).await
    }

    fn name(&self) -> &'static str {
        "http"
    }
}

/// Build the HTTP application.
///
/// Unknown paths, and known paths hit with the wrong method (`HEAD` included),
/// answer 404. `/execute` buffers the whole body whatever its size.
pub fn router<C: Connector>(query_tool: QueryToolHandler<C>) -> Router {
    Router::new()
        .route("/status", get(status).head(not_found).fallback(not_found))
        .route(
            "/execute",
            post(execute::<C>)
                .fallback(not_found)
                .layer(DefaultBodyLimit::disable()),
        )
        .fallback(not_found)
        .with_state(query_tool)
        .layer(middleware::from_fn(preflight))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static(ALLOW_ORIGIN),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_METHODS,
            HeaderValue::from_static(ALLOW_METHODS),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOW_HEADERS),
        ))
}

async fn status() -> Json<StatusResponse> {
    Json(StatusResponse {
        status: "running",
        kind: "mysql",
        tools: tool_names(),
    })
}

async fn execute<C: Connector>(
    State(query_tool): State<QueryToolHandler<C>>,
    body: Bytes,
) -> Result<Json<ExecuteResponse>, DbError> {
    let request = parse_execute_request(&body).inspect_err(|e| {
        warn!(error = %e, "Rejected /execute body");
    })?;

    let results = query_tool
        .call(request.tool.as_ref(), request.parameters)
        .await
        .inspect_err(|e| {
            if e.is_client_error() {
                warn!(error = %e, "Rejected /execute request");
            } else {
                error!(error = %e, "Query failed");
            }
        })?;

    Ok(Json(ExecuteResponse { results }))
}

/// The body must be a JSON object; anything else is an invalid body.
fn parse_execute_request(body: &[u8]) -> DbResult<ExecuteRequest> {
    let value: JsonValue = serde_json::from_slice(body)?;
    if !value.is_object() {
        return Err(DbError::invalid_json("request body is not a JSON object"));
    }
    Ok(serde_json::from_value(value)?)
}

async fn not_found() -> (StatusCode, Json<ErrorBody>) {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorBody {
            error: "Not found".to_string(),
        }),
    )
}

/// Answer every `OPTIONS` request with an empty 200, whatever the path.
async fn preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}
