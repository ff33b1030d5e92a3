//! TraceDB HTTP API
//!
//! Routes:
//! - `POST /api/traces` - ingest a batch of events
//! - `GET /api/traces?limit=N` - most recent root events
//! - `GET /api/traces/:id` - one event with its request's call tree
//! - `GET /api/requests/:request_id` - all events of a request with the tree
//! - `GET /health` - liveness
//!
//! Store calls block, so every handler runs them on tokio's blocking pool.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;

pub use error::{AppError, ErrorResponse};

use axum::body::Bytes;
use axum::extract::{DefaultBodyLimit, Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracedb_engine::{RequestView, RootRow, TraceDatabase, TraceView};

/// Shared handler state
#[derive(Debug, Clone)]
pub struct AppState {
    /// Database backing every route
    pub db: TraceDatabase,
}

/// Successful ingestion response
#[derive(Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngestResponse {
    /// Always `true`
    pub success: bool,
    /// Number of events in the batch, including ones that already existed
    pub count: usize,
}

/// Query string of the root listing
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    /// Maximum rows to return
    pub limit: Option<usize>,
}

/// Build the application router
pub fn router(db: TraceDatabase) -> Router {
    let body_limit = db.config().max_body_bytes;
    let state = Arc::new(AppState { db });

    Router::new()
        .route("/api/traces", get(list_roots).post(ingest_traces))
        .route("/api/traces/:id", get(get_trace))
        .route("/api/requests/:request_id", get(get_request))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn ingest_traces(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<IngestResponse>, AppError> {
    let db = state.db.clone();
    let receipt = tokio::task::spawn_blocking(move || db.ingest_bytes(&body)).await??;
    Ok(Json(IngestResponse {
        success: true,
        count: receipt.accepted,
    }))
}

async fn list_roots(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListParams>,
) -> Result<Json<Vec<RootRow>>, AppError> {
    let db = state.db.clone();
    let rows = tokio::task::spawn_blocking(move || db.recent_roots(params.limit)).await??;
    Ok(Json(rows))
}

async fn get_trace(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TraceView>, AppError> {
    let db = state.db.clone();
    let view = tokio::task::spawn_blocking(move || db.trace_view(&id))
        .await?
        .map_err(|e| AppError::with_not_found(e, "Trace not found"))?;
    Ok(Json(view))
}

async fn get_request(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<String>,
) -> Result<Json<RequestView>, AppError> {
    let db = state.db.clone();
    let view = tokio::task::spawn_blocking(move || db.request_view(&request_id))
        .await?
        .map_err(|e| AppError::with_not_found(e, "Request not found"))?;
    Ok(Json(view))
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}
