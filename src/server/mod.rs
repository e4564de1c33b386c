//! REST API server for ipscope
//!
//! Exposes the lookup operations over HTTP with JSON envelopes:
//!
//! - `GET /api/current-ip` - look up the server's public IP
//! - `POST /api/lookup-ip` - look up a specific address (`{"ip_address": "..."}`)
//! - `GET /api/test-connection` - probe the upstream API
//! - `GET /health` - liveness check
//!
//! Successful lookups return `{"success": true, "data": <report>}`; failures
//! return `{"error": "..."}` with a status derived from the failure class.
//! The blocking upstream client runs on the blocking thread pool.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::client::{LookupError, LookupResult};
use crate::lens::lookup::LookupLens;
use crate::lens::report::IpReport;

// =============================================================================
// Server Configuration
// =============================================================================

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind to
    pub address: String,

    /// Port to listen on
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            address: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl ServerConfig {
    /// Create a new server configuration
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the address
    pub fn with_address(mut self, address: impl Into<String>) -> Self {
        self.address = address.into();
        self
    }

    /// Set the port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Get the full bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

// =============================================================================
// Server State
// =============================================================================

/// Shared server state
#[derive(Clone)]
pub struct ServerState {
    /// Lookup lens shared across handlers
    pub lens: Arc<LookupLens>,
}

impl ServerState {
    /// Create state around a lookup lens
    pub fn new(lens: LookupLens) -> Self {
        Self {
            lens: Arc::new(lens),
        }
    }
}

// =============================================================================
// Router
// =============================================================================

/// Create the Axum router with all API routes registered
pub fn create_router(state: ServerState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/current-ip", get(current_ip_handler))
        .route("/api/lookup-ip", post(lookup_ip_handler))
        .route("/api/test-connection", get(test_connection_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Health check handler
async fn health_handler() -> &'static str {
    "OK"
}

async fn current_ip_handler(State(state): State<ServerState>) -> Response {
    let lens = state.lens.clone();
    run_lookup(move || lens.lookup_current()).await
}

/// Request body for specific-address lookups
#[derive(Debug, Deserialize)]
struct LookupRequest {
    #[serde(default)]
    ip_address: String,
}

async fn lookup_ip_handler(
    State(state): State<ServerState>,
    Json(request): Json<LookupRequest>,
) -> Response {
    let lens = state.lens.clone();
    run_lookup(move || lens.lookup_address(&request.ip_address)).await
}

async fn test_connection_handler(State(state): State<ServerState>) -> Response {
    let lens = state.lens.clone();
    let reachable = tokio::task::spawn_blocking(move || lens.test_connection())
        .await
        .unwrap_or(false);

    if reachable {
        Json(json!({"success": true, "message": "API connection successful"})).into_response()
    } else {
        (
            StatusCode::BAD_GATEWAY,
            Json(json!({"success": false, "message": "API connection failed"})),
        )
            .into_response()
    }
}

/// Run a blocking lookup on the blocking pool and wrap it in the JSON envelope
async fn run_lookup<F>(lookup: F) -> Response
where
    F: FnOnce() -> LookupResult<IpReport> + Send + 'static,
{
    match tokio::task::spawn_blocking(lookup).await {
        Ok(Ok(report)) => Json(json!({"success": true, "data": report})).into_response(),
        Ok(Err(err)) => {
            tracing::debug!("lookup failed: {}", err);
            (error_status(&err), Json(json!({"error": err.to_string()}))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": format!("lookup task failed: {}", e)})),
        )
            .into_response(),
    }
}

/// Map a lookup failure onto an HTTP status for the JSON error envelope
pub fn error_status(err: &LookupError) -> StatusCode {
    match err {
        LookupError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        LookupError::UnprocessableAddress(_) => StatusCode::UNPROCESSABLE_ENTITY,
        LookupError::RateLimited => StatusCode::SERVICE_UNAVAILABLE,
        LookupError::Timeout => StatusCode::GATEWAY_TIMEOUT,
        LookupError::Unauthorized
        | LookupError::UpstreamStatus(_)
        | LookupError::Connection(_)
        | LookupError::Transport(_)
        | LookupError::InvalidBody(_)
        | LookupError::InvalidResponse => StatusCode::BAD_GATEWAY,
    }
}

// =============================================================================
// Server Startup
// =============================================================================

/// Start the REST API server
pub async fn start_server(state: ServerState, config: ServerConfig) -> anyhow::Result<()> {
    let app = create_router(state);

    let bind_address = config.bind_address();
    tracing::info!("Starting API server on {}", bind_address);

    let listener = tokio::net::TcpListener::bind(&bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

// =============================================================================
// Tests
// =============================================================================
