//! Streamable HTTP transport: MCP under `/mcp`, liveness under `/health`.

use axum::{extract::State, routing::get, Json, Router};
use rmcp::transport::streamable_http_server::{
    session::local::LocalSessionManager, StreamableHttpServerConfig, StreamableHttpService,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

use crate::{CircuitSimMcpServer, HttpConfig};

/// Build the router without binding a socket.
pub fn build_http_app(server: CircuitSimMcpServer, config: &HttpConfig) -> Router {
    let session_manager = Arc::new(LocalSessionManager::default());
    let factory_server = server.clone();

    let http_service = StreamableHttpService::new(
        move || Ok(factory_server.clone()),
        session_manager,
        StreamableHttpServerConfig {
            sse_keep_alive: Some(Duration::from_secs(config.keep_alive_seconds)),
            stateful_mode: true,
        },
    );

    // nest_service hands every /mcp method to the MCP service
    Router::new()
        .nest_service("/mcp", http_service)
        .route("/health", get(health_check))
        .route("/status", get(status))
        .with_state(server)
}

/// Bind `config.bind_address()` and serve until the process stops
pub async fn start_http_server(
    server: CircuitSimMcpServer,
    config: HttpConfig,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| format!("Invalid bind address {}: {}", config.bind_address(), e))?;

    let app = build_http_app(server, &config);

    info!("CircuitSim MCP HTTP server listening on http://{}", addr);
    info!("  POST http://{}/mcp - Initialize session and send MCP requests", addr);
    info!("  GET  http://{}/mcp - Open SSE stream (requires Mcp-Session-Id header)", addr);
    info!("  GET  http://{}/health - Health check", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

async fn status(State(server): State<CircuitSimMcpServer>) -> Json<Value> {
    let tools = server.tools();
    Json(json!({
        "service": "circuitsim",
        "version": env!("CARGO_PKG_VERSION"),
        "engine": tools.simulator().engine_name(),
        "circuits": tools.circuit_count(),
        "library_parts": tools.library().len(),
    }))
}
