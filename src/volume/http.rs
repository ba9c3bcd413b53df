//! HTTP API for a storage node
//!
//! - `PUT /?filename=<name>`: store body under name (204, 400, 500)
//! - `GET /?filename=<name>`: return stored bytes (200, 400, 404, 500)

use crate::common::tracing_middleware::request_tracing_middleware;
use crate::common::Error;
use crate::volume::blob::BlobStore;
use axum::{
    body::Bytes,
    extract::{DefaultBodyLimit, Query, State},
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::limit::RequestBodyLimitLayer;

#[derive(Clone)]
pub struct VolumeState {
    pub store: Arc<BlobStore>,
    pub node_id: String,
}

#[derive(Debug, Deserialize)]
struct ShardQuery {
    #[serde(default)]
    filename: String,
}

pub fn create_router(state: VolumeState, max_shard_size: usize) -> Router {
    Router::new()
        .route("/", get(get_blob).put(put_blob))
        .route("/health", get(health))
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(request_tracing_middleware))
                .layer(DefaultBodyLimit::disable())
                .layer(RequestBodyLimitLayer::new(max_shard_size)),
        )
        .with_state(state)
}

async fn put_blob(
    State(state): State<VolumeState>,
    Query(query): Query<ShardQuery>,
    body: Bytes,
) -> Result<StatusCode, Error> {
    state.store.put(&query.filename, &body).await.map_err(|e| {
        tracing::error!(filename = %query.filename, error = %e, "save file");
        e
    })?;
    tracing::debug!(filename = %query.filename, size = body.len(), "blob stored");
    Ok(StatusCode::NO_CONTENT)
}

async fn get_blob(
    State(state): State<VolumeState>,
    Query(query): Query<ShardQuery>,
) -> Result<impl IntoResponse, Error> {
    let data = state
        .store
        .get(&query.filename)
        .await
        .map_err(|e| {
            tracing::error!(filename = %query.filename, error = %e, "load file");
            e
        })?
        .ok_or_else(|| Error::NotFound(query.filename.clone()))?;

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        data,
    ))
}

async fn health(State(state): State<VolumeState>) -> impl IntoResponse {
    Json(json!({
        "status": "healthy",
        "node_id": state.node_id,
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
