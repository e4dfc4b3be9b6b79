//! Execution ledger types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Overall status of a ghost execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Status of one recorded step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Skipped,
}

/// Well-known strategy strings recorded on execution steps.
///
/// Strategies are strings rather than a closed enum because healed steps
/// carry a `self_healed:` prefix over the substitute's own strategy.
pub mod strategy {
    pub const SEMANTIC: &str = "semantic";
    pub const STRUCTURAL: &str = "structural";
    pub const VISUAL: &str = "visual";
    pub const COORDINATE: &str = "coordinate";
    pub const API: &str = "api";
    pub const HUMAN: &str = "human";
    pub const DIRECT: &str = "direct";
    pub const UNKNOWN: &str = "unknown";

    /// Prefix a strategy for a step reached through self-healing.
    pub fn self_healed(inner: &str) -> String {
        format!("self_healed:{inner}")
    }

    /// The ordered element-selection ladder. Coordinate selection is a last
    /// resort and deprecated.
    pub const SELECTION_LADDER: [&str; 4] = [SEMANTIC, STRUCTURAL, VISUAL, COORDINATE];
}

/// One execution of a ghost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Execution {
    pub id: Uuid,
    pub ghost_id: Uuid,
    pub status: ExecutionStatus,
    #[serde(default)]
    pub parameters: serde_json::Value,
    pub trigger: String,
    pub step_count: u32,
    pub started_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Execution {
    pub fn start(ghost_id: Uuid, parameters: serde_json::Value, trigger: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            ghost_id,
            status: ExecutionStatus::Running,
            parameters,
            trigger: trigger.into(),
            step_count: 0,
            started_at: Utc::now(),
            completed_at: None,
            error: None,
        }
    }
}

/// One recorded step of an execution, in attempt order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStep {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub node_id: String,
    pub status: StepStatus,
    pub strategy: String,
    pub duration_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl ExecutionStep {
    pub fn new(execution_id: Uuid, node_id: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            execution_id,
            node_id: node_id.into(),
            status: StepStatus::Pending,
            strategy: strategy::SEMANTIC.to_string(),
            duration_ms: 0,
            output: None,
            error: None,
            created_at: Utc::now(),
        }
    }
}

/// Append-only audit row written after an execution is finalized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionLog {
    pub id: Uuid,
    pub execution_id: Uuid,
    pub ghost_id: Uuid,
    pub org_id: String,
    pub status: ExecutionStatus,
    pub steps: u32,
    pub duration_ms: u64,
    /// Distinct strategy strings across the execution's steps.
    pub strategies_used: Vec<String>,
    pub logged_at: DateTime<Utc>,
}
