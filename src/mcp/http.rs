//! HTTP transport for the MCP server
//!
//! Each `POST /mcp` body is one JSON-RPC message handled exactly like a stdio
//! line. Notifications are acknowledged with `202 Accepted` and no body.

use super::server::McpServer;
use crate::error::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::{future::Future, net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

/// Build the router serving `server`
pub fn router(server: Arc<McpServer>) -> Router {
    Router::new()
        .route("/mcp", post(mcp_handler))
        .route("/health", get(health_handler))
        .with_state(server)
        .layer(TraceLayer::new_for_http())
}

/// Serve on `addr` until `shutdown` resolves
pub async fn serve_http<F>(server: Arc<McpServer>, addr: SocketAddr, shutdown: F) -> Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("MCP HTTP server listening on http://{}/mcp", listener.local_addr()?);

    axum::serve(listener, router(server))
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("MCP HTTP server stopped");
    Ok(())
}

async fn mcp_handler(State(server): State<Arc<McpServer>>, body: String) -> Response {
    match server.handle_line(body.trim()).await {
        Some(response) => Json(response).into_response(),
        None => StatusCode::ACCEPTED.into_response(),
    }
}

async fn health_handler() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}
