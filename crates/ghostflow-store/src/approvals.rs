//! The approval workflow.
//!
//! Both surfaces that can change a ghost's approval state (the HTTP
//! endpoint and a dashboard-style direct caller) go through
//! [`apply_approval`], so version rows and approval-request resolution stay
//! consistent regardless of the path.

use tracing::info;
use uuid::Uuid;

use ghostflow_protocols::{ApprovalAction, ApprovalStatus, GhostStatus, GhostVersion, StoreError};

use crate::scope::OrgScope;
use crate::traits::GovernanceStore;

/// Result of an approval action.
#[derive(Debug, Clone)]
pub struct ApprovalOutcome {
    pub new_status: GhostStatus,
    pub version: u32,
    pub is_active: bool,
}

/// Apply an approval action to a ghost: run the state machine, bump the
/// version and insert the immutable version row when the transition calls
/// for it, and resolve any pending approval request.
pub async fn apply_approval(
    store: &dyn GovernanceStore,
    scope: &OrgScope,
    ghost_id: Uuid,
    action: ApprovalAction,
    approved_by: Option<String>,
    decision_note: Option<String>,
) -> Result<ApprovalOutcome, StoreError> {
    let mut ghost = store.get_ghost(scope, ghost_id).await?;

    let transition = ghost
        .status
        .apply(action)
        .map_err(|e| StoreError::Conflict(e.to_string()))?;

    let changed = transition.new_status != ghost.status || transition.is_active != ghost.is_active;

    ghost.status = transition.new_status;
    ghost.is_active = transition.is_active;
    if matches!(action, ApprovalAction::Approve) {
        ghost.approved_by = approved_by.clone().or(ghost.approved_by);
    }
    if transition.bump_version {
        ghost.version += 1;
    }
    ghost.updated_at = chrono::Utc::now();

    if changed || transition.bump_version {
        store.update_ghost(scope, ghost.clone()).await?;
    }

    if transition.bump_version {
        let version = GhostVersion::snapshot(&ghost, decision_note.clone());
        store.insert_ghost_version(scope, version).await?;
        info!(ghost = %ghost.id, version = ghost.version, "ghost version recorded");
    }

    let resolution = match action {
        ApprovalAction::Approve => Some(ApprovalStatus::Approved),
        ApprovalAction::Reject | ApprovalAction::Archive => Some(ApprovalStatus::Rejected),
        _ => None,
    };
    if let Some(status) = resolution {
        store
            .resolve_pending_approval(scope, ghost_id, status, approved_by, decision_note)
            .await?;
    }

    Ok(ApprovalOutcome {
        new_status: ghost.status,
        version: ghost.version,
        is_active: ghost.is_active,
    })
}

#[cfg(test)]
#[path = "approvals_tests.rs"]
mod tests;
