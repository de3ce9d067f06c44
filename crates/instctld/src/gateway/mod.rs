//! HTTP gateway (Axum) for instance control.
//!
//! Every route is a GET with query-string parameters. Handlers are thin: they
//! hand the parameters to [`InstanceController`] and serialize what comes
//! back.

pub mod error;
pub mod handler;

use axum::{Json, Router, routing::get};
use instctl_core::InstanceController;
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub use error::{ApiError, ErrorResponse};
pub use handler::{instance_handler, instances_handler, regions_handler};

/// Shared, read-only state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<InstanceController>,
}

impl AppState {
    pub fn new(controller: InstanceController) -> Self {
        Self {
            controller: Arc::new(controller),
        }
    }
}

pub fn create_router_with_state(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/regions", get(regions_handler))
        .route("/api/instances", get(instances_handler))
        .route("/api/instance", get(instance_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

#[derive(serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[tracing::instrument]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
