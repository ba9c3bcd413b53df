//! HTTP API for the coordinator
//!
//! - `PUT /?filename=<name>`: store a file (204 / 400 / 503)
//! - `GET /?filename=<name>`: read a file back (200 / 400 / 404 / 500)
//! - `POST /register`: storage node announcement, idempotent (204 / 400)
//! - `GET /health`, `GET /admin/status`

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::Error;
use crate::coordinator::orchestrator::Orchestrator;
use crate::coordinator::registry::{NodeId, Registration};
use crate::coordinator::SHARD_COUNT;
use axum::{
    body::Bytes,
    extract::{ConnectInfo, DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

/// Shared coordinator state for HTTP handlers.
#[derive(Clone)]
pub struct CoordState {
    pub orchestrator: Arc<Orchestrator>,
}

#[derive(Debug, Deserialize)]
pub struct FileQuery {
    #[serde(default)]
    pub filename: String,
}

/// Body of `POST /register`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegisterRequest {
    pub id: String,
    pub port: u16,
}

/// Creates the HTTP router with all public endpoints.
pub fn create_router(state: CoordState, max_file_size: usize) -> Router {
    Router::new()
        .route("/", get(get_file).put(put_file))
        .route("/register", post(register))
        .route("/health", get(health))
        .route("/admin/status", get(admin_status))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_tracing_middleware))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_file_size)),
        )
        .with_state(state)
}

async fn put_file(
    State(state): State<CoordState>,
    Query(query): Query<FileQuery>,
    body: Bytes,
) -> Result<StatusCode, Error> {
    state.orchestrator.write(&query.filename, body).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_file(
    State(state): State<CoordState>,
    Query(query): Query<FileQuery>,
) -> Result<impl IntoResponse, Error> {
    let data = state.orchestrator.read(&query.filename).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

/// Node host comes from the connection, the port from the body.
async fn register(
    State(state): State<CoordState>,
    ConnectInfo(remote): ConnectInfo<SocketAddr>,
    body: Bytes,
) -> Result<StatusCode, Error> {
    let req: RegisterRequest = serde_json::from_slice(&body).map_err(|e| {
        tracing::error!(error = %e, "cant parse register request");
        Error::BadRequest(format!("error parsing register request: {}", e))
    })?;
    let id = NodeId::new(req.id)?;
    let addr = SocketAddr::new(remote.ip(), req.port);

    // A repeated announce is answered exactly like the first one.
    if state.orchestrator.registry().register(id, addr) == Registration::AlreadyPresent {
        tracing::debug!(addr = %addr, "duplicate registration acknowledged");
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

/// Cluster overview: registered nodes, stored files, whether writes are admitted
async fn admin_status(State(state): State<CoordState>) -> impl IntoResponse {
    let registry = state.orchestrator.registry();
    let nodes = registry.nodes();
    Json(json!({
        "nodes": nodes.len(),
        "files": state.orchestrator.files().len(),
        "shard_count": SHARD_COUNT,
        "quorum": nodes.len() >= SHARD_COUNT,
        "registered": nodes,
    }))
}
