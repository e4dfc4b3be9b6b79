//! Pattern detection endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectRequest {
    pub org_id: Option<String>,
    #[allow(dead_code)]
    pub batch_id: Option<String>,
    pub trigger: Option<String>,
}

/// POST /pattern-detector
pub async fn detect_patterns(
    State(state): State<Arc<AppState>>,
    Json(body): Json<DetectRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.increment_requests();

    let org_id = body
        .org_id
        .as_deref()
        .filter(|org| !org.trim().is_empty())
        .ok_or(ApiError::MissingOrg)?;
    let trigger = body.trigger.as_deref().unwrap_or("manual");

    let patterns = state
        .detector
        .detect(org_id, trigger)
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    info!(org_id, found = patterns.len(), "pattern detection served");

    Ok(Json(Envelope::ok(serde_json::json!({
        "patternsFound": patterns.len(),
        "patterns": patterns,
    }))))
}
