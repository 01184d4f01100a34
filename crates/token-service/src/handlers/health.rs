//! Health check handler.

use crate::models::{HealthResponse, SERVICE_NAME};
use crate::routes::AppState;
use axum::extract::State;
use axum::Json;
use std::sync::Arc;

/// Liveness check.
///
/// Always healthy while the process serves requests; the media server is
/// not probed.
#[tracing::instrument(skip_all, name = "ts.health")]
pub async fn health_check(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: SERVICE_NAME.to_string(),
        server_url: state.config.server_url.clone(),
    })
}
