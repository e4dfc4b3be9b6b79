//! Ghost approval endpoint.

use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use ghostflow_protocols::{ApprovalAction, StoreError};
use ghostflow_store::{apply_approval, OrgScope};

use crate::envelope::Envelope;
use crate::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApproveRequest {
    pub ghost_id: Option<String>,
    pub action: Option<String>,
    pub decision_note: Option<String>,
    pub approved_by: Option<String>,
}

/// POST /approve-ghost
pub async fn approve_ghost(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ApproveRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.increment_requests();

    let ghost_id = body
        .ghost_id
        .as_deref()
        .ok_or_else(|| ApiError::InvalidBatch("ghost_id missing".into()))?;
    let ghost_id = Uuid::parse_str(ghost_id)
        .map_err(|_| ApiError::InvalidBatch("ghost_id is not a UUID".into()))?;

    let action = match body.action.as_deref() {
        Some("approve") => ApprovalAction::Approve,
        Some("reject") => ApprovalAction::Reject,
        Some("pause") => ApprovalAction::Pause,
        Some("activate") => ApprovalAction::Activate,
        Some("archive") => ApprovalAction::Archive,
        other => {
            return Err(ApiError::InvalidBatch(format!(
                "invalid action: {}",
                other.unwrap_or("(missing)")
            )))
        }
    };

    // Resolve the tenant before applying, so the state machine runs under
    // the ghost's own org scope.
    let ghost = state.store.get_ghost(&OrgScope::service(), ghost_id).await?;
    let scope = OrgScope::tenant(&ghost.org_id)?;

    let outcome = apply_approval(
        state.store.as_ref(),
        &scope,
        ghost_id,
        action,
        body.approved_by,
        body.decision_note,
    )
    .await
    .map_err(|error| match error {
        StoreError::Conflict(message) => ApiError::InvalidBatch(message),
        StoreError::NotFound(_) => ApiError::GhostNotFound,
        other => ApiError::Internal(other.to_string()),
    })?;

    info!(ghost = %ghost_id, status = ?outcome.new_status, version = outcome.version, "approval applied");

    Ok(Json(Envelope::ok(serde_json::json!({
        "success": true,
        "new_status": outcome.new_status,
        "version": outcome.version,
    }))))
}
