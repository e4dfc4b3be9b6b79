//! Governance rows: approvals, feedback, org settings, policies.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Action requested against a ghost's approval state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalAction {
    Approve,
    Reject,
    Pause,
    Activate,
    Archive,
}

/// Terminal-or-pending status of an approval request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Expired,
}

/// A human approval request for a pending ghost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalRequest {
    pub id: Uuid,
    pub ghost_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<Uuid>,
    pub org_id: String,
    pub requested_by: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    pub status: ApprovalStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decision_note: Option<String>,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resolved_at: Option<DateTime<Utc>>,
}

impl ApprovalRequest {
    /// Default lifetime before auto-expiry.
    pub const TTL_HOURS: i64 = 24;

    pub fn new(ghost_id: Uuid, org_id: impl Into<String>, requested_by: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            ghost_id,
            execution_id: None,
            org_id: org_id.into(),
            requested_by: requested_by.into(),
            approved_by: None,
            status: ApprovalStatus::Pending,
            reason: None,
            decision_note: None,
            expires_at: now + Duration::hours(Self::TTL_HOURS),
            created_at: now,
            resolved_at: None,
        }
    }

    /// Whether this request has passed its expiry without resolution.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.status == ApprovalStatus::Pending && now >= self.expires_at
    }
}

/// Append-only user feedback on an execution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserFeedback {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub ghost_id: Uuid,
    pub org_id: String,
    pub user_id: String,
    /// Satisfaction in `[1, 5]`, when given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub satisfaction_score: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub corrected_actions: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Per-tenant configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrgSettings {
    pub org_id: String,
    #[serde(default)]
    pub settings: serde_json::Value,
    pub auto_approve_threshold: f32,
    pub max_executions_per_minute: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub llm_model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub require_approval_above_value: Option<f64>,
}

impl OrgSettings {
    pub fn defaults(org_id: impl Into<String>) -> Self {
        Self {
            org_id: org_id.into(),
            settings: serde_json::json!({}),
            auto_approve_threshold: 0.95,
            max_executions_per_minute: 10,
            llm_provider: None,
            llm_model: None,
            require_approval_above_value: None,
        }
    }
}

/// Decision taken by an automation policy when its condition matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PolicyAction {
    RequireApproval,
    Block,
    Notify,
    Allow,
}

/// An org-scoped automation policy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutomationPolicy {
    pub id: Uuid,
    pub org_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub condition: serde_json::Value,
    pub action: PolicyAction,
    pub is_active: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_request_expiry() {
        let req = ApprovalRequest::new(Uuid::new_v4(), "o1", "user-1");
        assert!(!req.is_expired(Utc::now()));
        assert!(req.is_expired(Utc::now() + Duration::hours(25)));
    }

    #[test]
    fn test_resolved_request_never_expires() {
        let mut req = ApprovalRequest::new(Uuid::new_v4(), "o1", "user-1");
        req.status = ApprovalStatus::Approved;
        assert!(!req.is_expired(Utc::now() + Duration::hours(48)));
    }

    #[test]
    fn test_org_settings_defaults() {
        let settings = OrgSettings::defaults("o1");
        assert_eq!(settings.auto_approve_threshold, 0.95);
        assert_eq!(settings.max_executions_per_minute, 10);
    }

    #[test]
    fn test_approval_action_wire_names() {
        assert_eq!(serde_json::to_string(&ApprovalAction::Approve).unwrap(), "\"approve\"");
        assert_eq!(serde_json::to_string(&PolicyAction::RequireApproval).unwrap(), "\"require_approval\"");
    }
}
