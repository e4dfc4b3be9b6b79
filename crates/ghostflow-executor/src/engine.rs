//! The execution engine.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{error, info, warn};
use uuid::Uuid;

use ghostflow_protocols::{
    strategy, ActionSpec, Execution, ExecutionLog, ExecutionNode, ExecutionStatus, ExecutionStep,
    Ghost, LlmProvider, StepStatus, ToolKind,
};
use ghostflow_store::{GovernanceStore, OrgScope};

use crate::error::ExecutorError;
use crate::heal::propose_substitute;
use crate::planner::resolve_plan;

/// Result of one ghost execution.
#[derive(Debug, Clone)]
pub struct ExecutionOutcome {
    pub execution: Execution,
    pub steps: Vec<ExecutionStep>,
}

/// What one node produced, before it becomes a step record.
struct NodeResult {
    status: StepStatus,
    strategy: String,
    output: Option<serde_json::Value>,
    error: Option<String>,
    duration_ms: u64,
}

impl NodeResult {
    fn new(status: StepStatus, strategy: &str) -> Self {
        Self {
            status,
            strategy: strategy.to_string(),
            output: None,
            error: None,
            duration_ms: 0,
        }
    }

    fn with_output(mut self, output: serde_json::Value) -> Self {
        self.output = Some(output);
        self
    }

    fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }
}

/// Executes approved ghosts: plans, dispatches nodes, self-heals, and
/// writes the ledger. The engine records browser intents for the external
/// driver; it performs HTTP itself only for `api_call` nodes.
pub struct ExecutionEngine {
    store: Arc<dyn GovernanceStore>,
    provider: Arc<dyn LlmProvider>,
    http: reqwest::Client,
}

impl ExecutionEngine {
    pub fn new(store: Arc<dyn GovernanceStore>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            store,
            provider,
            http: reqwest::Client::new(),
        }
    }

    /// Execute a ghost end to end. The audit row is written on every path
    /// that reaches a running execution, including total failure.
    pub async fn execute(
        &self,
        ghost_id: Uuid,
        parameters: serde_json::Value,
        trigger: impl Into<String>,
    ) -> Result<ExecutionOutcome, ExecutorError> {
        let ghost = self.store.get_ghost(&OrgScope::service(), ghost_id).await?;
        if !ghost.status.allows_execution() {
            return Err(ExecutorError::GhostNotApproved(ghost_id.to_string()));
        }
        let scope = OrgScope::tenant(&ghost.org_id)?;

        let mut execution = Execution::start(ghost.id, parameters, trigger);
        self.store.insert_execution(&scope, execution.clone()).await?;
        info!(ghost = %ghost.id, execution = %execution.id, "execution started");

        let plan = resolve_plan(&ghost, self.provider.as_ref()).await;
        let (steps, all_originals_ok, first_error) =
            self.run_plan(&scope, &ghost, execution.id, &plan).await;

        execution.status = if all_originals_ok {
            ExecutionStatus::Completed
        } else {
            ExecutionStatus::Failed
        };
        execution.error = first_error;
        execution.step_count = steps.len() as u32;
        execution.completed_at = Some(Utc::now());
        self.store.update_execution(&scope, execution.clone()).await?;

        self.append_audit(&scope, &ghost, &execution, &steps).await;

        Ok(ExecutionOutcome { execution, steps })
    }

    /// Run the plan nodes in order, self-healing failures. Returns the
    /// recorded steps, whether every original step finished, and the first
    /// error message.
    async fn run_plan(
        &self,
        scope: &OrgScope,
        ghost: &Ghost,
        execution_id: Uuid,
        plan: &[ExecutionNode],
    ) -> (Vec<ExecutionStep>, bool, Option<String>) {
        let mut steps: Vec<ExecutionStep> = Vec::new();
        let mut all_originals_ok = true;
        let mut first_error: Option<String> = None;

        for node in plan {
            let result = self.run_node(node).await;
            let failed = result.status == StepStatus::Failed;
            let error_text = result.error.clone();
            steps.push(self.record_step(scope, execution_id, &node.id, result).await);

            if !failed {
                continue;
            }
            all_originals_ok = false;
            if first_error.is_none() {
                first_error = error_text.clone();
            }

            // Self-heal: one substitute step, strategy-prefixed.
            let error_text = error_text.unwrap_or_else(|| "step failed".to_string());
            let Some(substitute) =
                propose_substitute(self.provider.as_ref(), node, &error_text).await
            else {
                warn!(ghost = %ghost.id, node = %node.id, "self-heal replan failed, stopping");
                break;
            };

            let mut healed = self.run_node(&substitute).await;
            healed.strategy = strategy::self_healed(&healed.strategy);
            let healed_failed = healed.status == StepStatus::Failed;
            steps.push(self.record_step(scope, execution_id, &substitute.id, healed).await);

            if healed_failed {
                warn!(ghost = %ghost.id, node = %node.id, "substitute step failed, stopping");
                break;
            }
        }

        (steps, all_originals_ok, first_error)
    }

    /// Execute one node, honoring its timeout.
    async fn run_node(&self, node: &ExecutionNode) -> NodeResult {
        let started = std::time::Instant::now();
        let mut result = match node.timeout {
            Some(ms) => {
                match tokio::time::timeout(Duration::from_millis(ms), self.dispatch(node)).await {
                    Ok(result) => result,
                    Err(_) => NodeResult::new(StepStatus::Failed, strategy::DIRECT)
                        .with_error(format!("Step timed out after {ms} ms")),
                }
            }
            None => self.dispatch(node).await,
        };
        result.duration_ms = started.elapsed().as_millis() as u64;
        result
    }

    async fn dispatch(&self, node: &ExecutionNode) -> NodeResult {
        let Some(action) = &node.action else {
            return NodeResult::new(StepStatus::Skipped, strategy::DIRECT)
                .with_output(serde_json::json!({ "note": "No action attached to node" }));
        };

        match action.tool {
            ToolKind::ApiCall => self.run_api_call(action).await,
            ToolKind::NavigateTo
            | ToolKind::ClickElement
            | ToolKind::InputText
            | ToolKind::ExtractData => record_browser_intent(action),
            ToolKind::HumanEscalation => {
                NodeResult::new(StepStatus::Completed, strategy::HUMAN).with_output(
                    serde_json::json!({
                        "escalated": true,
                        "reason": action.params.get("reason").cloned()
                            .unwrap_or(serde_json::Value::Null),
                        "context": action.params.get("context").cloned()
                            .unwrap_or(serde_json::Value::Null),
                    }),
                )
            }
            ToolKind::Unknown => NodeResult::new(StepStatus::Completed, strategy::UNKNOWN)
                .with_output(serde_json::json!({ "error": "Unknown tool" })),
        }
    }

    /// Perform the HTTP request of an `api_call` node. Transport errors
    /// fail the step; any HTTP response is recorded as output.
    async fn run_api_call(&self, action: &ActionSpec) -> NodeResult {
        let endpoint = action
            .params
            .get("endpoint")
            .and_then(|v| v.as_str())
            .unwrap_or_default()
            .to_string();
        let method = action
            .params
            .get("method")
            .and_then(|v| v.as_str())
            .unwrap_or("GET")
            .to_uppercase();

        let method = match reqwest::Method::from_bytes(method.as_bytes()) {
            Ok(method) => method,
            Err(_) => {
                return NodeResult::new(StepStatus::Failed, strategy::DIRECT)
                    .with_error(format!("Invalid HTTP method: {method}"));
            }
        };

        let mut request = self.http.request(method, &endpoint);
        if let Some(headers) = action.params.get("headers").and_then(|v| v.as_object()) {
            for (name, value) in headers {
                if let Some(value) = value.as_str() {
                    request = request.header(name, value);
                }
            }
        }
        if let Some(body) = action.params.get("body") {
            if !body.is_null() {
                request = request.json(body);
            }
        }

        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let headers: serde_json::Map<String, serde_json::Value> = response
                    .headers()
                    .iter()
                    .filter_map(|(name, value)| {
                        value
                            .to_str()
                            .ok()
                            .map(|v| (name.to_string(), serde_json::Value::from(v)))
                    })
                    .collect();
                let text = response.text().await.unwrap_or_default();
                let body = serde_json::from_str::<serde_json::Value>(&text)
                    .unwrap_or(serde_json::Value::String(text));
                NodeResult::new(StepStatus::Completed, strategy::API).with_output(
                    serde_json::json!({
                        "status": status,
                        "headers": headers,
                        "body": body,
                    }),
                )
            }
            Err(error) => {
                NodeResult::new(StepStatus::Failed, strategy::DIRECT).with_error(error.to_string())
            }
        }
    }

    async fn record_step(
        &self,
        scope: &OrgScope,
        execution_id: Uuid,
        node_id: &str,
        result: NodeResult,
    ) -> ExecutionStep {
        let mut step = ExecutionStep::new(execution_id, node_id);
        step.status = result.status;
        step.strategy = result.strategy;
        step.output = result.output;
        step.error = result.error;
        step.duration_ms = result.duration_ms;
        if let Err(error) = self.store.append_step(scope, step.clone()).await {
            error!(%error, "failed to record execution step");
        }
        step
    }

    /// The audit row is best-effort but unconditional: failures are logged,
    /// never propagated, so the execution result always reaches the caller.
    async fn append_audit(
        &self,
        scope: &OrgScope,
        ghost: &Ghost,
        execution: &Execution,
        steps: &[ExecutionStep],
    ) {
        let strategies: BTreeSet<String> = steps.iter().map(|s| s.strategy.clone()).collect();
        let duration_ms = execution
            .completed_at
            .map(|done| (done - execution.started_at).num_milliseconds().max(0) as u64)
            .unwrap_or(0);
        let log = ExecutionLog {
            id: Uuid::new_v4(),
            execution_id: execution.id,
            ghost_id: ghost.id,
            org_id: ghost.org_id.clone(),
            status: execution.status,
            steps: steps.len() as u32,
            duration_ms,
            strategies_used: strategies.into_iter().collect(),
            logged_at: Utc::now(),
        };
        if let Err(error) = self.store.append_execution_log(scope, log).await {
            error!(%error, "failed to append audit row");
        }
    }
}

/// Browser tools are not driven here; the intent is recorded for the
/// client-side driver, honoring a requested selector strategy.
fn record_browser_intent(action: &ActionSpec) -> NodeResult {
    let requested = action
        .params
        .get("selector_strategy")
        .and_then(|v| v.as_str())
        .unwrap_or(strategy::SEMANTIC);
    NodeResult::new(StepStatus::Completed, requested).with_output(serde_json::json!({
        "action": action.tool.as_str(),
        "params": action.params,
        "note": "Queued for client-side browser execution",
    }))
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
