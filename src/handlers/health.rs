//! Health probe

use axum::extract::State;
use axum::Json;

use crate::app_state::AppState;
use crate::models::HealthResponse;

/// Liveness and readiness probe. Reports whether the ML model registry
/// finished loading; unauthenticated by design.
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        service: "ai-service".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        models_loaded: state.ml.models_loaded(),
    })
}
