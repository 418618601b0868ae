//! HTTP server for signed URL endpoints
//!
//! Provides /health, /url/{*path}, /cache/invalidate and /cache/sweep.

use crate::types::{HealthResponse, ResolveResponse, SweepResponse, UrlSource};
use axum::{
    extract::{Path, State},
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use signed_url_cache::SignedUrlCache;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

static X_CACHE: HeaderName = HeaderName::from_static("x-cache");

/// Shared state for the HTTP server
pub struct ServerState {
    pub cache: SignedUrlCache,
    pub started_at: DateTime<Utc>,
}

impl ServerState {
    pub fn new(cache: SignedUrlCache) -> Self {
        Self {
            cache,
            started_at: Utc::now(),
        }
    }
}

pub type SharedState = Arc<ServerState>;

/// Error response
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

/// Create the HTTP router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/url/{*path}", get(resolve_url).delete(invalidate_url))
        .route("/cache/invalidate", post(invalidate_all))
        .route("/cache/sweep", post(sweep))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the HTTP server
pub async fn start_server(state: SharedState, port: u16) -> std::io::Result<()> {
    let router = create_router(state);
    let addr = std::net::SocketAddr::from(([0, 0, 0, 0], port));
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router).await
}

/// Health check endpoint
async fn health(State(state): State<SharedState>) -> Json<HealthResponse> {
    let cache_stats = state.cache.stats().await;
    let uptime_secs = (Utc::now() - state.started_at).num_seconds() as u64;

    Json(HealthResponse {
        status: "ok".to_string(),
        uptime_secs,
        cache: cache_stats,
    })
}

/// Resolve an object path to a signed URL
async fn resolve_url(State(state): State<SharedState>, Path(path): Path<String>) -> Response {
    let lookup = state.cache.lookup(&path).await;

    let source = UrlSource::from_lookup(&lookup);
    match (source, lookup.into_url()) {
        (Some(source), Some(url)) => (
            StatusCode::OK,
            [
                (header::CACHE_CONTROL, "private, no-store"),
                (X_CACHE.clone(), source.cache_header()),
            ],
            Json(ResolveResponse { url, source }),
        )
            .into_response(),
        _ => {
            warn!(path = %path, "No signed URL available");
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse {
                    error: "Signed URL unavailable".to_string(),
                }),
            )
                .into_response()
        }
    }
}

/// Forget the cached URL for one object, e.g. after it was replaced
async fn invalidate_url(State(state): State<SharedState>, Path(path): Path<String>) -> StatusCode {
    state.cache.invalidate(&path).await;
    StatusCode::NO_CONTENT
}

/// Forget every cached URL; called when the signed-in user changes
async fn invalidate_all(State(state): State<SharedState>) -> StatusCode {
    state.cache.invalidate_all().await;
    StatusCode::NO_CONTENT
}

async fn sweep(State(state): State<SharedState>) -> Json<SweepResponse> {
    let removed = state.cache.sweep_expired().await;
    Json(SweepResponse { removed })
}
