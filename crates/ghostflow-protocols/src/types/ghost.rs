//! Ghost templates: approved, parameterized workflow definitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use uuid::Uuid;

use super::governance::ApprovalAction;

/// Lifecycle status of a ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GhostStatus {
    PendingApproval,
    Approved,
    Active,
    Paused,
    Archived,
}

impl GhostStatus {
    /// Whether executions are permitted in this status.
    pub fn allows_execution(&self) -> bool {
        matches!(self, GhostStatus::Approved | GhostStatus::Active)
    }
}

/// Result of applying an approval action to a ghost status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GhostTransition {
    pub new_status: GhostStatus,
    pub is_active: bool,
    /// True when this transition increments the version and inserts an
    /// immutable version row.
    pub bump_version: bool,
}

impl GhostStatus {
    /// The approval state machine.
    ///
    /// ```text
    /// pending_approval --approve--> approved (active, version += 1)
    /// pending_approval --reject --> archived
    /// any              --archive--> archived
    /// approved|active  --pause  --> paused
    /// paused|approved  --activate-> active
    /// ```
    ///
    /// Approving an already approved or active ghost is a no-op transition:
    /// state stays consistent and the version does not advance.
    pub fn apply(&self, action: ApprovalAction) -> Result<GhostTransition, InvalidTransition> {
        use GhostStatus::*;
        let t = |new_status, is_active, bump_version| GhostTransition {
            new_status,
            is_active,
            bump_version,
        };
        match (action, *self) {
            (ApprovalAction::Approve, PendingApproval) => Ok(t(Approved, true, true)),
            (ApprovalAction::Approve, Approved) => Ok(t(Approved, true, false)),
            (ApprovalAction::Approve, Active) => Ok(t(Active, true, false)),
            (ApprovalAction::Reject, PendingApproval) => Ok(t(Archived, false, false)),
            (ApprovalAction::Archive, _) => Ok(t(Archived, false, false)),
            (ApprovalAction::Pause, Approved) | (ApprovalAction::Pause, Active) => {
                Ok(t(Paused, false, false))
            }
            (ApprovalAction::Activate, Paused) | (ApprovalAction::Activate, Approved) => {
                Ok(t(Active, true, false))
            }
            (action, status) => Err(InvalidTransition { action, from: status }),
        }
    }
}

/// Rejected approval-action transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("action {action:?} is not valid from status {from:?}")]
pub struct InvalidTransition {
    pub action: ApprovalAction,
    pub from: GhostStatus,
}

/// Trigger source for a ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerType {
    Event,
    Schedule,
    Api,
}

/// When a ghost should run. The condition is opaque JSON: the engine carries
/// it for the approval surface and version rows but never evaluates it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trigger {
    #[serde(rename = "type")]
    pub trigger_type: TriggerType,
    #[serde(default)]
    pub condition: serde_json::Value,
}

impl Trigger {
    pub fn api() -> Self {
        Self {
            trigger_type: TriggerType::Api,
            condition: serde_json::Value::Null,
        }
    }
}

/// Parameter value type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    String,
    Number,
    Boolean,
    Object,
}

/// A declared ghost parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParameterDef {
    pub name: String,
    #[serde(rename = "type")]
    pub param_type: ParamType,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<serde_json::Value>,
}

/// Execution plan node kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    Action,
    Condition,
    Loop,
    Parallel,
}

/// Tool invoked by an action node.
///
/// Unrecognized tool names deserialize to [`ToolKind::Unknown`]; the engine
/// records the step rather than failing the plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    NavigateTo,
    ClickElement,
    InputText,
    ApiCall,
    ExtractData,
    HumanEscalation,
    #[serde(other)]
    Unknown,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::NavigateTo => "navigate_to",
            ToolKind::ClickElement => "click_element",
            ToolKind::InputText => "input_text",
            ToolKind::ApiCall => "api_call",
            ToolKind::ExtractData => "extract_data",
            ToolKind::HumanEscalation => "human_escalation",
            ToolKind::Unknown => "unknown",
        }
    }
}

/// Action carried by an action node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionSpec {
    pub tool: ToolKind,
    #[serde(default)]
    pub params: serde_json::Value,
}

/// A vertex of the execution plan DAG.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionNode {
    pub id: String,
    #[serde(rename = "type")]
    pub node_type: NodeType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<ActionSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub condition: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fallback: Option<String>,
    /// Per-node execution bound in milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,
}

impl ExecutionNode {
    /// A plain action node.
    pub fn action(id: impl Into<String>, tool: ToolKind, params: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            node_type: NodeType::Action,
            action: Some(ActionSpec { tool, params }),
            condition: None,
            children: None,
            fallback: None,
            timeout: None,
        }
    }

    /// The single-step plan used when planning fails.
    pub fn escalation(reason: impl Into<String>) -> Self {
        Self::action(
            "escalate",
            ToolKind::HumanEscalation,
            serde_json::json!({ "reason": reason.into() }),
        )
    }
}

/// Plan validation failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlanError {
    #[error("plan is empty")]
    Empty,
    #[error("duplicate node id: {0}")]
    DuplicateId(String),
    #[error("node {node} references unknown child {child}")]
    UnknownChild { node: String, child: String },
    #[error("plan contains a cycle through {0}")]
    Cycle(String),
}

/// Validate that a plan is a DAG with resolvable child references.
pub fn validate_plan(nodes: &[ExecutionNode]) -> Result<(), PlanError> {
    if nodes.is_empty() {
        return Err(PlanError::Empty);
    }

    let mut by_id: HashMap<&str, &ExecutionNode> = HashMap::new();
    for node in nodes {
        if by_id.insert(node.id.as_str(), node).is_some() {
            return Err(PlanError::DuplicateId(node.id.clone()));
        }
    }

    for node in nodes {
        for child in node.children.iter().flatten() {
            if !by_id.contains_key(child.as_str()) {
                return Err(PlanError::UnknownChild {
                    node: node.id.clone(),
                    child: child.clone(),
                });
            }
        }
    }

    // Depth-first cycle check over child edges.
    let mut done: HashSet<&str> = HashSet::new();
    for node in nodes {
        let mut in_progress: HashSet<&str> = HashSet::new();
        check_cycles(node, &by_id, &mut in_progress, &mut done)?;
    }
    Ok(())
}

fn check_cycles<'a>(
    node: &'a ExecutionNode,
    by_id: &HashMap<&'a str, &'a ExecutionNode>,
    in_progress: &mut HashSet<&'a str>,
    done: &mut HashSet<&'a str>,
) -> Result<(), PlanError> {
    if done.contains(node.id.as_str()) {
        return Ok(());
    }
    if !in_progress.insert(node.id.as_str()) {
        return Err(PlanError::Cycle(node.id.clone()));
    }
    for child in node.children.iter().flatten() {
        if let Some(next) = by_id.get(child.as_str()) {
            check_cycles(next, by_id, in_progress, done)?;
        }
    }
    in_progress.remove(node.id.as_str());
    done.insert(node.id.as_str());
    Ok(())
}

/// An approved, parameterized workflow template.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ghost {
    pub id: Uuid,
    pub org_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub version: u32,
    pub status: GhostStatus,
    pub trigger: Trigger,
    pub parameters: Vec<ParameterDef>,
    pub execution_plan: Vec<ExecutionNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source_pattern_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_by: Option<String>,
    /// Invariant: `is_active` implies `status.allows_execution()`.
    pub is_active: bool,
    #[serde(default)]
    pub usage_stats: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Ghost {
    /// A new pending ghost with an empty plan.
    pub fn new(org_id: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            org_id: org_id.into(),
            name: name.into(),
            description: None,
            version: 1,
            status: GhostStatus::PendingApproval,
            trigger: Trigger::api(),
            parameters: Vec::new(),
            execution_plan: Vec::new(),
            confidence: None,
            source_pattern_id: None,
            created_by: None,
            approved_by: None,
            is_active: false,
            usage_stats: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_plan(mut self, plan: Vec<ExecutionNode>) -> Self {
        self.execution_plan = plan;
        self
    }
}

/// Immutable snapshot row inserted on every version bump.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GhostVersion {
    pub id: Uuid,
    pub ghost_id: Uuid,
    pub version: u32,
    pub execution_plan: Vec<ExecutionNode>,
    pub parameters: Vec<ParameterDef>,
    pub trigger: Trigger,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub change_description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl GhostVersion {
    /// Snapshot the ghost's current plan at its current version.
    pub fn snapshot(ghost: &Ghost, change_description: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ghost_id: ghost.id,
            version: ghost.version,
            execution_plan: ghost.execution_plan.clone(),
            parameters: ghost.parameters.clone(),
            trigger: ghost.trigger.clone(),
            change_description,
            created_by: ghost.approved_by.clone().or_else(|| ghost.created_by.clone()),
            created_at: Utc::now(),
        }
    }
}
