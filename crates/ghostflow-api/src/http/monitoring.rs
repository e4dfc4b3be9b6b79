//! Health endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;

use crate::envelope::Envelope;
use crate::state::AppState;

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let provider_healthy = state.provider.health_check().await;
    Json(Envelope::ok(serde_json::json!({
        "status": if provider_healthy { "ok" } else { "degraded" },
        "provider": provider_healthy,
        "uptimeSecs": state.uptime().as_secs(),
        "requests": state.request_count(),
    })))
}
