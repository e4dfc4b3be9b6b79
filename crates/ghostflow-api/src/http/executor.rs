//! Ghost execution endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecuteRequest {
    pub ghost_id: Option<String>,
    pub parameters: Option<serde_json::Value>,
    pub trigger: Option<String>,
}

/// POST /ghost-executor
pub async fn execute_ghost(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ExecuteRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.increment_requests();

    let ghost_id = body
        .ghost_id
        .as_deref()
        .filter(|id| !id.trim().is_empty())
        .ok_or(ApiError::MissingGhost)?;
    let ghost_id = Uuid::parse_str(ghost_id).map_err(|_| ApiError::MissingGhost)?;

    let parameters = body.parameters.unwrap_or(serde_json::json!({}));
    let trigger = body.trigger.unwrap_or_else(|| "api".to_string());

    let outcome = state.engine.execute(ghost_id, parameters, trigger).await?;
    info!(
        execution = %outcome.execution.id,
        status = ?outcome.execution.status,
        steps = outcome.steps.len(),
        "execution served"
    );

    Ok(Json(Envelope::ok(serde_json::json!({
        "executionId": outcome.execution.id,
        "status": outcome.execution.status,
        "steps": outcome.steps,
    }))))
}
