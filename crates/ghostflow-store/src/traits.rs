//! Governance store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use ghostflow_protocols::{
    ApprovalRequest, ApprovalStatus, DetectedPattern, Execution, ExecutionLog, ExecutionStep,
    Ghost, GhostVersion, OrgSettings, StoreError, StoredEvent, UserFeedback,
};

use crate::scope::OrgScope;

/// The persistence contract for every Ghostflow entity.
///
/// All reads and writes carry an [`OrgScope`]; implementations must refuse
/// rows the scope does not authorize. `execution_logs` and `user_feedback`
/// are append-only: the update/delete operations exist only so the
/// invariant is enforceable and testable, and always fail.
#[async_trait]
pub trait GovernanceStore: Send + Sync {
    // --- secure events ---

    /// Persist a batch of ingested events.
    async fn insert_events(&self, scope: &OrgScope, rows: Vec<StoredEvent>)
        -> Result<(), StoreError>;

    /// The most recent events for an org, newest first.
    async fn recent_events(
        &self,
        scope: &OrgScope,
        org_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, StoreError>;

    // --- detected patterns ---

    /// Insert or update a pattern by its deterministic id. Existing
    /// human decisions (approved/dismissed status) are preserved.
    async fn upsert_pattern(
        &self,
        scope: &OrgScope,
        pattern: DetectedPattern,
    ) -> Result<DetectedPattern, StoreError>;

    async fn list_patterns(
        &self,
        scope: &OrgScope,
        org_id: &str,
    ) -> Result<Vec<DetectedPattern>, StoreError>;

    // --- ghosts and versions ---

    /// Insert a ghost. When `source_pattern_id` is present it must
    /// reference an existing pattern of the same org.
    async fn insert_ghost(&self, scope: &OrgScope, ghost: Ghost) -> Result<Ghost, StoreError>;

    async fn get_ghost(&self, scope: &OrgScope, id: Uuid) -> Result<Ghost, StoreError>;

    async fn update_ghost(&self, scope: &OrgScope, ghost: Ghost) -> Result<(), StoreError>;

    async fn insert_ghost_version(
        &self,
        scope: &OrgScope,
        version: GhostVersion,
    ) -> Result<(), StoreError>;

    async fn list_ghost_versions(
        &self,
        scope: &OrgScope,
        ghost_id: Uuid,
    ) -> Result<Vec<GhostVersion>, StoreError>;

    // --- executions ---

    async fn insert_execution(
        &self,
        scope: &OrgScope,
        execution: Execution,
    ) -> Result<(), StoreError>;

    async fn update_execution(
        &self,
        scope: &OrgScope,
        execution: Execution,
    ) -> Result<(), StoreError>;

    async fn append_step(&self, scope: &OrgScope, step: ExecutionStep) -> Result<(), StoreError>;

    async fn list_steps(
        &self,
        scope: &OrgScope,
        execution_id: Uuid,
    ) -> Result<Vec<ExecutionStep>, StoreError>;

    // --- audit ledger (append-only) ---

    async fn append_execution_log(
        &self,
        scope: &OrgScope,
        log: ExecutionLog,
    ) -> Result<(), StoreError>;

    async fn list_execution_logs(
        &self,
        scope: &OrgScope,
        org_id: &str,
    ) -> Result<Vec<ExecutionLog>, StoreError>;

    /// Always fails: the ledger is append-only.
    async fn update_execution_log(
        &self,
        _scope: &OrgScope,
        _log: ExecutionLog,
    ) -> Result<(), StoreError> {
        Err(StoreError::AppendOnly("execution_logs"))
    }

    /// Always fails: the ledger is append-only.
    async fn delete_execution_log(&self, _scope: &OrgScope, _id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::AppendOnly("execution_logs"))
    }

    // --- approvals ---

    async fn insert_approval(
        &self,
        scope: &OrgScope,
        request: ApprovalRequest,
    ) -> Result<(), StoreError>;

    /// Resolve the pending request for a ghost, if one exists.
    async fn resolve_pending_approval(
        &self,
        scope: &OrgScope,
        ghost_id: Uuid,
        status: ApprovalStatus,
        decided_by: Option<String>,
        decision_note: Option<String>,
    ) -> Result<Option<ApprovalRequest>, StoreError>;

    /// Expire pending requests past their deadline. Returns how many
    /// transitioned.
    async fn expire_stale_approvals(
        &self,
        scope: &OrgScope,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError>;

    // --- feedback (append-only) ---

    async fn append_feedback(
        &self,
        scope: &OrgScope,
        feedback: UserFeedback,
    ) -> Result<(), StoreError>;

    async fn list_feedback(
        &self,
        scope: &OrgScope,
        ghost_id: Uuid,
    ) -> Result<Vec<UserFeedback>, StoreError>;

    /// Always fails: feedback is append-only.
    async fn update_feedback(
        &self,
        _scope: &OrgScope,
        _feedback: UserFeedback,
    ) -> Result<(), StoreError> {
        Err(StoreError::AppendOnly("user_feedback"))
    }

    /// Always fails: feedback is append-only.
    async fn delete_feedback(&self, _scope: &OrgScope, _id: Uuid) -> Result<(), StoreError> {
        Err(StoreError::AppendOnly("user_feedback"))
    }

    // --- org settings ---

    /// Settings for an org, falling back to defaults.
    async fn org_settings(&self, scope: &OrgScope, org_id: &str)
        -> Result<OrgSettings, StoreError>;

    async fn put_org_settings(
        &self,
        scope: &OrgScope,
        settings: OrgSettings,
    ) -> Result<(), StoreError>;
}
