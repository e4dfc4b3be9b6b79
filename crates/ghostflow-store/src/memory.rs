//! In-memory governance store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;
use uuid::Uuid;

use ghostflow_protocols::{
    ApprovalRequest, ApprovalStatus, DetectedPattern, Execution, ExecutionLog, ExecutionStep,
    Ghost, GhostVersion, OrgSettings, PatternStatus, StoreError, StoredEvent, UserFeedback,
};

use crate::scope::OrgScope;
use crate::traits::GovernanceStore;

#[derive(Default)]
struct Inner {
    events: Vec<StoredEvent>,
    patterns: HashMap<String, DetectedPattern>,
    ghosts: HashMap<Uuid, Ghost>,
    versions: Vec<GhostVersion>,
    executions: HashMap<Uuid, Execution>,
    steps: Vec<ExecutionStep>,
    logs: Vec<ExecutionLog>,
    approvals: Vec<ApprovalRequest>,
    feedback: Vec<UserFeedback>,
    settings: HashMap<String, OrgSettings>,
}

/// Map-backed store. Stands in for the relational backend in tests and
/// single-process deployments; enforces the same scope and append-only
/// invariants the SQL policies do.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn ghost_org(&self, ghost_id: Uuid) -> Result<String, StoreError> {
        self.inner
            .read()
            .ghosts
            .get(&ghost_id)
            .map(|g| g.org_id.clone())
            .ok_or_else(|| StoreError::NotFound(format!("ghost {ghost_id}")))
    }
}

#[async_trait]
impl GovernanceStore for MemoryStore {
    async fn insert_events(
        &self,
        scope: &OrgScope,
        rows: Vec<StoredEvent>,
    ) -> Result<(), StoreError> {
        for row in &rows {
            scope.require(&row.event.org_id)?;
        }
        debug!(count = rows.len(), "persisting secure events");
        self.inner.write().events.extend(rows);
        Ok(())
    }

    async fn recent_events(
        &self,
        scope: &OrgScope,
        org_id: &str,
        limit: usize,
    ) -> Result<Vec<StoredEvent>, StoreError> {
        scope.require(org_id)?;
        let inner = self.inner.read();
        let mut rows: Vec<StoredEvent> = inner
            .events
            .iter()
            .filter(|row| row.event.org_id == org_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.ingested_at.cmp(&a.ingested_at));
        rows.truncate(limit);
        Ok(rows)
    }

    async fn upsert_pattern(
        &self,
        scope: &OrgScope,
        mut pattern: DetectedPattern,
    ) -> Result<DetectedPattern, StoreError> {
        scope.require(&pattern.org_id)?;
        let mut inner = self.inner.write();
        if let Some(existing) = inner.patterns.get(&pattern.id) {
            pattern.created_at = existing.created_at;
            pattern.first_seen = pattern.first_seen.min(existing.first_seen);
            // Human decisions survive re-detection.
            if matches!(existing.status, PatternStatus::Approved | PatternStatus::Dismissed) {
                pattern.status = existing.status;
            }
        }
        pattern.updated_at = Utc::now();
        inner.patterns.insert(pattern.id.clone(), pattern.clone());
        Ok(pattern)
    }

    async fn list_patterns(
        &self,
        scope: &OrgScope,
        org_id: &str,
    ) -> Result<Vec<DetectedPattern>, StoreError> {
        scope.require(org_id)?;
        let inner = self.inner.read();
        let mut patterns: Vec<DetectedPattern> = inner
            .patterns
            .values()
            .filter(|p| p.org_id == org_id)
            .cloned()
            .collect();
        patterns.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        Ok(patterns)
    }

    async fn insert_ghost(&self, scope: &OrgScope, ghost: Ghost) -> Result<Ghost, StoreError> {
        scope.require(&ghost.org_id)?;
        let mut inner = self.inner.write();
        if let Some(pattern_id) = &ghost.source_pattern_id {
            let valid = inner
                .patterns
                .get(pattern_id)
                .is_some_and(|p| p.org_id == ghost.org_id);
            if !valid {
                return Err(StoreError::InvalidReference(format!(
                    "source pattern {pattern_id} not found for org {}",
                    ghost.org_id
                )));
            }
        }
        if inner.ghosts.contains_key(&ghost.id) {
            return Err(StoreError::Conflict(format!("ghost {} exists", ghost.id)));
        }
        inner.ghosts.insert(ghost.id, ghost.clone());
        Ok(ghost)
    }

    async fn get_ghost(&self, scope: &OrgScope, id: Uuid) -> Result<Ghost, StoreError> {
        let inner = self.inner.read();
        let ghost = inner
            .ghosts
            .get(&id)
            .ok_or_else(|| StoreError::NotFound(format!("ghost {id}")))?;
        scope.require(&ghost.org_id)?;
        Ok(ghost.clone())
    }

    async fn update_ghost(&self, scope: &OrgScope, ghost: Ghost) -> Result<(), StoreError> {
        scope.require(&ghost.org_id)?;
        let mut inner = self.inner.write();
        if !inner.ghosts.contains_key(&ghost.id) {
            return Err(StoreError::NotFound(format!("ghost {}", ghost.id)));
        }
        inner.ghosts.insert(ghost.id, ghost);
        Ok(())
    }

    async fn insert_ghost_version(
        &self,
        scope: &OrgScope,
        version: GhostVersion,
    ) -> Result<(), StoreError> {
        let org = self.ghost_org(version.ghost_id)?;
        scope.require(&org)?;
        let mut inner = self.inner.write();
        // UNIQUE(ghost_id, version)
        if inner
            .versions
            .iter()
            .any(|v| v.ghost_id == version.ghost_id && v.version == version.version)
        {
            return Err(StoreError::Conflict(format!(
                "version {} of ghost {} exists",
                version.version, version.ghost_id
            )));
        }
        inner.versions.push(version);
        Ok(())
    }

    async fn list_ghost_versions(
        &self,
        scope: &OrgScope,
        ghost_id: Uuid,
    ) -> Result<Vec<GhostVersion>, StoreError> {
        let org = self.ghost_org(ghost_id)?;
        scope.require(&org)?;
        let inner = self.inner.read();
        let mut versions: Vec<GhostVersion> = inner
            .versions
            .iter()
            .filter(|v| v.ghost_id == ghost_id)
            .cloned()
            .collect();
        versions.sort_by_key(|v| v.version);
        Ok(versions)
    }

    async fn insert_execution(
        &self,
        scope: &OrgScope,
        execution: Execution,
    ) -> Result<(), StoreError> {
        let org = self.ghost_org(execution.ghost_id)?;
        scope.require(&org)?;
        self.inner.write().executions.insert(execution.id, execution);
        Ok(())
    }

    async fn update_execution(
        &self,
        scope: &OrgScope,
        execution: Execution,
    ) -> Result<(), StoreError> {
        let org = self.ghost_org(execution.ghost_id)?;
        scope.require(&org)?;
        let mut inner = self.inner.write();
        if !inner.executions.contains_key(&execution.id) {
            return Err(StoreError::NotFound(format!("execution {}", execution.id)));
        }
        inner.executions.insert(execution.id, execution);
        Ok(())
    }

    async fn append_step(&self, _scope: &OrgScope, step: ExecutionStep) -> Result<(), StoreError> {
        self.inner.write().steps.push(step);
        Ok(())
    }

    async fn list_steps(
        &self,
        _scope: &OrgScope,
        execution_id: Uuid,
    ) -> Result<Vec<ExecutionStep>, StoreError> {
        let inner = self.inner.read();
        Ok(inner
            .steps
            .iter()
            .filter(|s| s.execution_id == execution_id)
            .cloned()
            .collect())
    }

    async fn append_execution_log(
        &self,
        scope: &OrgScope,
        log: ExecutionLog,
    ) -> Result<(), StoreError> {
        scope.require(&log.org_id)?;
        self.inner.write().logs.push(log);
        Ok(())
    }

    async fn list_execution_logs(
        &self,
        scope: &OrgScope,
        org_id: &str,
    ) -> Result<Vec<ExecutionLog>, StoreError> {
        scope.require(org_id)?;
        let inner = self.inner.read();
        Ok(inner.logs.iter().filter(|l| l.org_id == org_id).cloned().collect())
    }

    async fn insert_approval(
        &self,
        scope: &OrgScope,
        request: ApprovalRequest,
    ) -> Result<(), StoreError> {
        scope.require(&request.org_id)?;
        self.inner.write().approvals.push(request);
        Ok(())
    }

    async fn resolve_pending_approval(
        &self,
        scope: &OrgScope,
        ghost_id: Uuid,
        status: ApprovalStatus,
        decided_by: Option<String>,
        decision_note: Option<String>,
    ) -> Result<Option<ApprovalRequest>, StoreError> {
        let mut inner = self.inner.write();
        let Some(request) = inner
            .approvals
            .iter_mut()
            .find(|r| r.ghost_id == ghost_id && r.status == ApprovalStatus::Pending)
        else {
            return Ok(None);
        };
        scope.require(&request.org_id)?;
        request.status = status;
        request.approved_by = decided_by;
        request.decision_note = decision_note;
        request.resolved_at = Some(Utc::now());
        Ok(Some(request.clone()))
    }

    async fn expire_stale_approvals(
        &self,
        scope: &OrgScope,
        now: DateTime<Utc>,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.write();
        let mut expired = 0;
        for request in inner.approvals.iter_mut() {
            if scope.authorizes(&request.org_id) && request.is_expired(now) {
                request.status = ApprovalStatus::Expired;
                request.resolved_at = Some(now);
                expired += 1;
            }
        }
        Ok(expired)
    }

    async fn append_feedback(
        &self,
        scope: &OrgScope,
        feedback: UserFeedback,
    ) -> Result<(), StoreError> {
        scope.require(&feedback.org_id)?;
        self.inner.write().feedback.push(feedback);
        Ok(())
    }

    async fn list_feedback(
        &self,
        scope: &OrgScope,
        ghost_id: Uuid,
    ) -> Result<Vec<UserFeedback>, StoreError> {
        let inner = self.inner.read();
        let rows: Vec<UserFeedback> = inner
            .feedback
            .iter()
            .filter(|f| f.ghost_id == ghost_id && scope.authorizes(&f.org_id))
            .cloned()
            .collect();
        Ok(rows)
    }

    async fn org_settings(
        &self,
        scope: &OrgScope,
        org_id: &str,
    ) -> Result<OrgSettings, StoreError> {
        scope.require(org_id)?;
        let inner = self.inner.read();
        Ok(inner
            .settings
            .get(org_id)
            .cloned()
            .unwrap_or_else(|| OrgSettings::defaults(org_id)))
    }

    async fn put_org_settings(
        &self,
        scope: &OrgScope,
        settings: OrgSettings,
    ) -> Result<(), StoreError> {
        scope.require(&settings.org_id)?;
        self.inner.write().settings.insert(settings.org_id.clone(), settings);
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
