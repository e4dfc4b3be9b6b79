//! Shared data model types.

mod element;
mod event;
mod execution;
mod ghost;
mod governance;
mod intent;
mod pattern;
mod secure;

pub use element::{
    AriaAttributes, Bounds, ElementContext, ElementFingerprint, ObservedElement, ParentInfo,
    PathSegment, Position, SiblingInfo,
};
pub use event::{
    EventContext, EventPayload, EventType, MutationRecord, RawEvent, Viewport,
};
pub use execution::{
    strategy, Execution, ExecutionLog, ExecutionStatus, ExecutionStep, StepStatus,
};
pub use ghost::{
    validate_plan, ActionSpec, ExecutionNode, Ghost, GhostStatus, GhostTransition, GhostVersion,
    InvalidTransition, NodeType, ParamType, ParameterDef, PlanError, ToolKind, Trigger,
    TriggerType,
};
pub use governance::{
    ApprovalAction, ApprovalRequest, ApprovalStatus, AutomationPolicy, OrgSettings, PolicyAction,
    UserFeedback,
};
pub use intent::{IntentClass, INTENT_DIMENSIONS};
pub use pattern::{DetectedPattern, PatternStatus};
pub use secure::{SecureEvent, SecureEventBatch, StoredEvent};

use std::collections::HashMap;

/// Metadata map type.
pub type Metadata = HashMap<String, serde_json::Value>;
