//! Health check handlers
//!
//! Provides health, readiness and index status endpoints for monitoring and orchestration.

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::state::AppState;

/// Health check response
#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    /// Service status
    #[schema(example = "healthy")]
    pub status: &'static str,
    /// Server version from Cargo.toml
    #[schema(example = "0.1.0")]
    pub version: &'static str,
    /// Service name
    #[schema(example = "visioncop-server")]
    pub service: &'static str,
}

/// Liveness check
///
/// Returns JSON with service status and version.
/// Used for monitoring and load balancer health checks.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses((status = 200, description = "Service is alive", body = HealthResponse))
)]
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
        service: "visioncop-server",
    })
}

/// Readiness response for Kubernetes
#[derive(Serialize, ToSchema)]
pub struct ReadyResponse {
    /// Whether the service is ready to accept traffic
    pub ready: bool,
    /// Optional message explaining status
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<&'static str>,
}

/// Kubernetes readiness probe
///
/// Returns 200 once the router is built: the index is opened and the
/// embedding model warmed up before the listener binds.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    responses((status = 200, description = "Service is ready", body = ReadyResponse))
)]
pub async fn ready() -> Json<ReadyResponse> {
    Json(ReadyResponse {
        ready: true,
        message: None,
    })
}

/// Index status response
#[derive(Serialize, ToSchema)]
pub struct StatusResponse {
    /// Number of indexed images
    #[schema(example = 42)]
    pub entries: usize,
    /// Embedding model name
    #[schema(example = "colour-layout-v1")]
    pub model: String,
    /// Embedding vector length
    #[schema(example = 320)]
    pub dimension: usize,
}

/// Index size and embedding model
#[utoipa::path(
    get,
    path = "/status",
    tag = "Health",
    responses((status = 200, description = "Index status", body = StatusResponse))
)]
pub async fn status_handler(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        entries: state.engine.len(),
        model: state.engine.model_name().to_string(),
        dimension: state.engine.dimension(),
    })
}
