use super::*;
use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use axum::routing::get;
use axum::{Json, Router};
use ghostflow_protocols::{
    CompletionRequest, CompletionResponse, FinishReason, GhostStatus, ProviderError, Usage,
};
use ghostflow_store::MemoryStore;

struct ScriptedProvider {
    script: Mutex<VecDeque<Result<String, ProviderError>>>,
}

impl ScriptedProvider {
    fn new(script: Vec<Result<String, ProviderError>>) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
        })
    }

    fn silent() -> Arc<Self> {
        Self::new(Vec::new())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn id(&self) -> &str {
        "scripted"
    }

    async fn complete(
        &self,
        _request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(ProviderError::Network("script exhausted".into())));
        next.map(|content| CompletionResponse {
            id: "cmpl-test".into(),
            model: "scripted".into(),
            content: Some(content),
            tool_calls: Vec::new(),
            usage: Usage::default(),
            finish_reason: FinishReason::Stop,
            latency_ms: 1,
        })
    }

    async fn health_check(&self) -> bool {
        true
    }
}

async fn spawn_ok_upstream() -> String {
    let app = Router::new().route("/ok", get(|| async { Json(serde_json::json!({ "ok": true })) }));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    format!("http://{addr}/ok")
}

/// An address nothing is listening on.
async fn refused_endpoint() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/broken")
}

fn api_node(id: &str, endpoint: &str) -> ExecutionNode {
    ExecutionNode::action(
        id,
        ToolKind::ApiCall,
        serde_json::json!({ "endpoint": endpoint, "method": "GET" }),
    )
}

async fn seed_ghost(store: &MemoryStore, plan: Vec<ExecutionNode>) -> Ghost {
    let mut ghost = Ghost::new("o1", "Test workflow").with_plan(plan);
    ghost.status = GhostStatus::Approved;
    ghost.is_active = true;
    store
        .insert_ghost(&OrgScope::tenant("o1").unwrap(), ghost)
        .await
        .unwrap()
}

fn heal_script() -> Vec<Result<String, ProviderError>> {
    vec![Ok(String::from(
        "{\"tool\": \"human_escalation\", \"params\": {\"reason\": \"upstream unavailable\"}}",
    ))]
}

#[tokio::test]
async fn test_api_node_executes_against_upstream() {
    let store = Arc::new(MemoryStore::new());
    let endpoint = spawn_ok_upstream().await;
    let ghost = seed_ghost(&store, vec![api_node("s1", &endpoint)]).await;
    let engine = ExecutionEngine::new(store.clone(), ScriptedProvider::silent());

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    assert_eq!(outcome.execution.status, ExecutionStatus::Completed);
    assert_eq!(outcome.steps.len(), 1);
    let step = &outcome.steps[0];
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.strategy, "api");
    let output = step.output.as_ref().unwrap();
    assert_eq!(output["status"], 200);
    assert_eq!(output["body"]["ok"], true);
}

#[tokio::test]
async fn test_failed_step_is_self_healed_and_execution_fails() {
    let store = Arc::new(MemoryStore::new());
    let endpoint = refused_endpoint().await;
    let ghost = seed_ghost(&store, vec![api_node("s1", &endpoint)]).await;
    let engine = ExecutionEngine::new(store.clone(), ScriptedProvider::new(heal_script()));

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    assert_eq!(outcome.steps.len(), 2);
    assert_eq!(outcome.steps[0].status, StepStatus::Failed);
    assert_eq!(outcome.steps[0].strategy, "direct");
    assert_eq!(outcome.steps[1].status, StepStatus::Completed);
    assert!(outcome.steps[1].strategy.starts_with("self_healed:"));
    // The healed substitute recovered the step, but no original step
    // completed, so the execution itself is failed.
    assert_eq!(outcome.execution.status, ExecutionStatus::Failed);

    let scope = OrgScope::tenant("o1").unwrap();
    let logs = store.list_execution_logs(&scope, "o1").await.unwrap();
    assert_eq!(logs.len(), 1, "the audit row must always be written");
    assert!(logs[0].strategies_used.iter().any(|s| s == "direct"));
    assert!(logs[0].strategies_used.iter().any(|s| s.starts_with("self_healed:")));
    assert_eq!(logs[0].steps, 2);
}

#[tokio::test]
async fn test_heal_failure_stops_and_finalizes_failed() {
    let store = Arc::new(MemoryStore::new());
    let endpoint = refused_endpoint().await;
    let ghost = seed_ghost(
        &store,
        vec![api_node("s1", &endpoint), api_node("s2", &endpoint)],
    )
    .await;
    // The repair call itself fails.
    let engine = ExecutionEngine::new(
        store.clone(),
        ScriptedProvider::new(vec![Err(ProviderError::Timeout(30))]),
    );

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    assert_eq!(outcome.execution.status, ExecutionStatus::Failed);
    assert_eq!(outcome.steps.len(), 1, "execution stops when replanning fails");

    let scope = OrgScope::tenant("o1").unwrap();
    assert_eq!(store.list_execution_logs(&scope, "o1").await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_execution_continues_past_healed_step() {
    let store = Arc::new(MemoryStore::new());
    let broken = refused_endpoint().await;
    let healthy = spawn_ok_upstream().await;
    let ghost = seed_ghost(&store, vec![api_node("s1", &broken), api_node("s2", &healthy)]).await;
    let engine = ExecutionEngine::new(store.clone(), ScriptedProvider::new(heal_script()));

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    // failed original, healed substitute, then the next original.
    assert_eq!(outcome.steps.len(), 3);
    assert_eq!(outcome.steps[2].node_id, "s2");
    assert_eq!(outcome.steps[2].status, StepStatus::Completed);
    assert_eq!(outcome.execution.status, ExecutionStatus::Failed);
}

#[tokio::test]
async fn test_browser_tools_record_intent() {
    let store = Arc::new(MemoryStore::new());
    let node = ExecutionNode::action(
        "click",
        ToolKind::ClickElement,
        serde_json::json!({ "selector": "button.submit", "selector_strategy": "structural" }),
    );
    let ghost = seed_ghost(&store, vec![node]).await;
    let engine = ExecutionEngine::new(store, ScriptedProvider::silent());

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    let step = &outcome.steps[0];
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.strategy, "structural");
    let output = step.output.as_ref().unwrap();
    assert_eq!(output["note"], "Queued for client-side browser execution");
    assert_eq!(output["action"], "click_element");
    assert_eq!(outcome.execution.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_unknown_tool_is_recorded_not_fatal() {
    let store = Arc::new(MemoryStore::new());
    let node: ExecutionNode = serde_json::from_value(serde_json::json!({
        "id": "s1",
        "type": "action",
        "action": { "tool": "teleport", "params": {} }
    }))
    .unwrap();
    let ghost = seed_ghost(&store, vec![node]).await;
    let engine = ExecutionEngine::new(store, ScriptedProvider::silent());

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    let step = &outcome.steps[0];
    assert_eq!(step.status, StepStatus::Completed);
    assert_eq!(step.strategy, "unknown");
    assert!(step.output.as_ref().unwrap().get("error").is_some());
    assert_eq!(outcome.execution.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_planner_fallback_escalates_to_human() {
    let store = Arc::new(MemoryStore::new());
    let ghost = seed_ghost(&store, Vec::new()).await;
    // Planner call fails; no heal should be needed afterwards.
    let engine = ExecutionEngine::new(
        store,
        ScriptedProvider::new(vec![Err(ProviderError::Timeout(30))]),
    );

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    assert_eq!(outcome.steps.len(), 1);
    let step = &outcome.steps[0];
    assert_eq!(step.strategy, "human");
    let output = step.output.as_ref().unwrap();
    assert_eq!(output["escalated"], true);
    assert_eq!(output["reason"], "Could not generate execution plan automatically");
    assert_eq!(outcome.execution.status, ExecutionStatus::Completed);
}

#[tokio::test]
async fn test_llm_generated_plan_is_executed() {
    let store = Arc::new(MemoryStore::new());
    let endpoint = spawn_ok_upstream().await;
    let ghost = seed_ghost(&store, Vec::new()).await;
    let plan_json = format!(
        "[{{\"id\": \"gen-1\", \"type\": \"action\", \"action\": {{\"tool\": \"api_call\", \
         \"params\": {{\"endpoint\": \"{endpoint}\", \"method\": \"GET\"}}}}}}]"
    );
    let engine = ExecutionEngine::new(store, ScriptedProvider::new(vec![Ok(plan_json)]));

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    assert_eq!(outcome.execution.status, ExecutionStatus::Completed);
    assert_eq!(outcome.steps[0].node_id, "gen-1");
    assert_eq!(outcome.steps[0].strategy, "api");
}

#[tokio::test]
async fn test_node_timeout_fails_step() {
    let store = Arc::new(MemoryStore::new());
    // A listener that accepts nothing: connects hang until the node timeout.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let _keep_alive = listener;

    let mut node = api_node("s1", &format!("http://{addr}/hang"));
    node.timeout = Some(200);
    let ghost = seed_ghost(&store, vec![node]).await;
    let engine = ExecutionEngine::new(store, ScriptedProvider::new(heal_script()));

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    assert_eq!(outcome.steps[0].status, StepStatus::Failed);
    assert!(outcome.steps[0].error.as_ref().unwrap().contains("timed out"));
    // The timeout routed into the self-heal path.
    assert!(outcome.steps[1].strategy.starts_with("self_healed:"));
}

#[tokio::test]
async fn test_missing_ghost_is_not_found() {
    let store = Arc::new(MemoryStore::new());
    let engine = ExecutionEngine::new(store, ScriptedProvider::silent());
    let result = engine.execute(Uuid::new_v4(), serde_json::json!({}), "api").await;
    assert!(matches!(result, Err(ExecutorError::GhostNotFound(_))));
}

#[tokio::test]
async fn test_pending_ghost_is_rejected() {
    let store = Arc::new(MemoryStore::new());
    let ghost = Ghost::new("o1", "Pending");
    let ghost = store
        .insert_ghost(&OrgScope::tenant("o1").unwrap(), ghost)
        .await
        .unwrap();
    let engine = ExecutionEngine::new(store, ScriptedProvider::silent());
    let result = engine.execute(ghost.id, serde_json::json!({}), "api").await;
    assert!(matches!(result, Err(ExecutorError::GhostNotApproved(_))));
}

#[tokio::test]
async fn test_steps_are_persisted_in_attempt_order() {
    let store = Arc::new(MemoryStore::new());
    let endpoint = spawn_ok_upstream().await;
    let ghost = seed_ghost(
        &store,
        vec![api_node("first", &endpoint), api_node("second", &endpoint)],
    )
    .await;
    let engine = ExecutionEngine::new(store.clone(), ScriptedProvider::silent());

    let outcome = engine
        .execute(ghost.id, serde_json::json!({}), "api")
        .await
        .unwrap();

    let scope = OrgScope::tenant("o1").unwrap();
    let persisted = store.list_steps(&scope, outcome.execution.id).await.unwrap();
    let order: Vec<&str> = persisted.iter().map(|s| s.node_id.as_str()).collect();
    assert_eq!(order, vec!["first", "second"]);
    assert_eq!(outcome.execution.step_count, 2);
}
