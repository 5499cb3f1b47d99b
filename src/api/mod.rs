//! HTTP interfaces for ingestion and querying
//!
//! - `POST /ingest` accepts a stream-trigger batch envelope
//! - `GET /query` runs a parameterized query (`type`, `hours`, `source`, `metric`)
//! - `/health` and `/ready` on both surfaces

pub mod ingest;
pub mod query;
mod telemetry;

use crate::ingester::Ingester;
use crate::query::QueryService;

use axum::http::{header, Method};
use axum::routing::{get, post};
use axum::{middleware, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

/// HTTP API server configuration
#[derive(Debug, Clone)]
pub struct ApiServerConfig {
    /// HTTP API port
    pub http_port: u16,
    /// Maximum request body size
    pub max_body_size: usize,
}

impl Default for ApiServerConfig {
    fn default() -> Self {
        Self {
            http_port: 8080,
            max_body_size: 6 * 1024 * 1024, // 6MB
        }
    }
}

/// Shared state of the ingestion surface
#[derive(Clone)]
pub struct IngestState {
    pub ingester: Arc<Ingester>,
}

/// Shared state of the query surface
#[derive(Clone)]
pub struct QueryState {
    pub service: Arc<QueryService>,
}

/// Build the ingestion router
pub fn build_ingest_router(ingester: Arc<Ingester>, config: &ApiServerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]);

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/ingest", post(ingest::handle_batch))
        .with_state(IngestState { ingester })
        .layer(axum::extract::DefaultBodyLimit::max(config.max_body_size))
        .layer(cors)
        .layer(middleware::from_fn(telemetry::http_observability_middleware))
}

/// Build the query router
///
/// CORS headers come from the response envelope itself.
pub fn build_query_router(service: Arc<QueryService>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(ready_check))
        .route("/query", get(query::handle_query))
        .with_state(QueryState { service })
        .layer(middleware::from_fn(telemetry::http_observability_middleware))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

/// Readiness check endpoint
async fn ready_check() -> &'static str {
    "READY"
}
