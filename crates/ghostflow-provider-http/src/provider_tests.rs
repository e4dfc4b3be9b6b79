use super::*;
use std::sync::{Arc, Mutex};

use axum::extract::State;
use axum::http::HeaderMap;
use axum::routing::{get, post};
use axum::{Json, Router};
use ghostflow_protocols::{ChatMessage, ToolSpec};

/// Last request seen by the stub: (authorization header, body).
#[derive(Default)]
struct Captured {
    inner: Mutex<Option<(Option<String>, serde_json::Value)>>,
}

impl Captured {
    fn set(&self, auth: Option<String>, body: serde_json::Value) {
        *self.inner.lock().unwrap() = Some((auth, body));
    }

    fn take(&self) -> Option<(Option<String>, serde_json::Value)> {
        self.inner.lock().unwrap().take()
    }
}

#[derive(Clone)]
struct StubState {
    captured: Arc<Captured>,
    response: Arc<serde_json::Value>,
    status: u16,
    delay_ms: u64,
}

async fn completions(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<serde_json::Value>,
) -> axum::response::Response {
    if state.delay_ms > 0 {
        tokio::time::sleep(std::time::Duration::from_millis(state.delay_ms)).await;
    }
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.captured.set(auth, body);

    let mut response = axum::response::Response::builder().status(state.status);
    if state.status == 429 {
        response = response.header("Retry-After", "7");
    }
    response
        .header("content-type", "application/json")
        .body(axum::body::Body::from(state.response.to_string()))
        .unwrap()
}

async fn spawn_stub(response: serde_json::Value, status: u16, delay_ms: u64) -> (String, Arc<Captured>) {
    let captured = Arc::new(Captured::default());
    let state = StubState {
        captured: captured.clone(),
        response: Arc::new(response),
        status,
        delay_ms,
    };
    let app = Router::new()
        .route("/v1/chat/completions", post(completions))
        .route("/v1/models", get(|| async { Json(serde_json::json!({ "data": [] })) }))
        .with_state(state);
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    (format!("http://{addr}/v1"), captured)
}

fn ok_response() -> serde_json::Value {
    serde_json::json!({
        "id": "cmpl-1",
        "model": "gpt-test",
        "choices": [{
            "message": { "role": "assistant", "content": "Hello there" },
            "finish_reason": "stop"
        }],
        "usage": { "prompt_tokens": 12, "completion_tokens": 3, "total_tokens": 15 }
    })
}

fn provider_for(base_url: &str) -> HttpLlmProvider {
    HttpLlmProvider::new(HttpProviderConfig::new(base_url, "sk-test", "gpt-test"))
}

#[tokio::test]
async fn test_complete_round_trip() {
    let (base, captured) = spawn_stub(ok_response(), 200, 0).await;
    let provider = provider_for(&base);

    let request = CompletionRequest::new(vec![
        ChatMessage::system("be brief"),
        ChatMessage::user("hello"),
    ])
    .with_temperature(0.3)
    .with_max_tokens(64);

    let response = provider.complete(request).await.unwrap();
    assert_eq!(response.content.as_deref(), Some("Hello there"));
    assert_eq!(response.finish_reason, FinishReason::Stop);
    assert_eq!(response.usage.total_tokens, 15);
    assert_eq!(response.model, "gpt-test");

    let (auth, body) = captured.take().unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
    assert_eq!(body["model"], "gpt-test");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["temperature"], 0.3);
    assert_eq!(body["max_tokens"], 64);
}

#[tokio::test]
async fn test_tools_are_sent_and_tool_calls_mapped() {
    let response = serde_json::json!({
        "id": "cmpl-2",
        "model": "gpt-test",
        "choices": [{
            "message": {
                "role": "assistant",
                "tool_calls": [{
                    "id": "call-1",
                    "type": "function",
                    "function": { "name": "api_call", "arguments": "{\"endpoint\": \"/x\"}" }
                }]
            },
            "finish_reason": "tool_calls"
        }]
    });
    let (base, captured) = spawn_stub(response, 200, 0).await;
    let provider = provider_for(&base);

    let request = CompletionRequest::new(vec![ChatMessage::user("go")]).with_tools(vec![
        ToolSpec::new("api_call", "Call an API", serde_json::json!({ "type": "object" })),
    ]);
    let response = provider.complete(request).await.unwrap();

    assert_eq!(response.finish_reason, FinishReason::ToolCalls);
    assert_eq!(response.tool_calls.len(), 1);
    assert_eq!(response.tool_calls[0].function.name, "api_call");

    let (_, body) = captured.take().unwrap();
    assert_eq!(body["tools"][0]["function"]["name"], "api_call");
}

#[tokio::test]
async fn test_rate_limit_carries_retry_after() {
    let (base, _) = spawn_stub(serde_json::json!({ "error": "slow down" }), 429, 0).await;
    let provider = provider_for(&base);
    let result = provider.complete(CompletionRequest::new(vec![ChatMessage::user("x")])).await;
    match result {
        Err(ProviderError::RateLimited { retry_after_seconds }) => {
            assert_eq!(retry_after_seconds, 7)
        }
        other => panic!("expected RateLimited, got {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_maps_to_api_error() {
    let (base, _) = spawn_stub(
        serde_json::json!({ "error": { "message": "upstream exploded" } }),
        500,
        0,
    )
    .await;
    let provider = provider_for(&base);
    let result = provider.complete(CompletionRequest::new(vec![ChatMessage::user("x")])).await;
    match result {
        Err(ProviderError::ApiError { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "upstream exploded");
        }
        other => panic!("expected ApiError, got {other:?}"),
    }
}

#[tokio::test]
async fn test_timeout_is_enforced() {
    let (base, _) = spawn_stub(ok_response(), 200, 3_000).await;
    let provider = provider_for(&base);
    let request =
        CompletionRequest::new(vec![ChatMessage::user("x")]).with_timeout_seconds(1);
    let result = provider.complete(request).await;
    assert!(matches!(result, Err(ProviderError::Timeout(1))));
}

#[tokio::test]
async fn test_health_check() {
    let (base, _) = spawn_stub(ok_response(), 200, 0).await;
    assert!(provider_for(&base).health_check().await);
    assert!(!provider_for("http://127.0.0.1:1/v1").health_check().await);
}

#[test]
fn test_finish_reason_mapping() {
    assert_eq!(map_finish_reason(Some("stop")), FinishReason::Stop);
    assert_eq!(map_finish_reason(Some("tool_calls")), FinishReason::ToolCalls);
    assert_eq!(map_finish_reason(Some("function_call")), FinishReason::ToolCalls);
    assert_eq!(map_finish_reason(Some("length")), FinishReason::Length);
    assert_eq!(map_finish_reason(Some("max_tokens")), FinishReason::Length);
    assert_eq!(map_finish_reason(Some("content_filter")), FinishReason::ContentFilter);
    assert_eq!(map_finish_reason(Some("weird")), FinishReason::Stop);
    assert_eq!(map_finish_reason(None), FinishReason::Stop);
}
