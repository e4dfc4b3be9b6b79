//! The HTTP adapter.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{debug, warn};

use ghostflow_protocols::{
    CompletionRequest, CompletionResponse, FinishReason, LlmProvider, ProviderError, Usage,
};

use crate::api::{encode_tool_choice, ApiErrorBody, ApiMessage, ApiRequest, ApiResponse, ApiTool};

/// Adapter configuration.
#[derive(Debug, Clone)]
pub struct HttpProviderConfig {
    /// Base URL up to the API root, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    /// Applied when a request carries no explicit timeout.
    pub default_timeout: Duration,
}

impl HttpProviderConfig {
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: api_key.into(),
            model: model.into(),
            default_timeout: Duration::from_secs(30),
        }
    }
}

/// OpenAI-compatible chat-completions provider.
pub struct HttpLlmProvider {
    config: HttpProviderConfig,
    client: reqwest::Client,
}

impl HttpLlmProvider {
    pub fn new(config: HttpProviderConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn post_completion(
        &self,
        request: &CompletionRequest,
    ) -> Result<ApiResponse, ProviderError> {
        let body = ApiRequest {
            model: self.config.model.clone(),
            messages: request.messages.iter().map(ApiMessage::from).collect(),
            tools: request.tools.iter().map(ApiTool::from).collect(),
            tool_choice: encode_tool_choice(&request.tool_choice),
            temperature: request.temperature,
            max_tokens: request.max_tokens,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status().as_u16();
        if !(200..300).contains(&status) {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok());
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiErrorBody>(&text)
                .map(|b| b.error.message().to_string())
                .unwrap_or(text);
            warn!(status, %message, "provider returned error");
            if status == 429 {
                return Err(ProviderError::RateLimited {
                    retry_after_seconds: retry_after.unwrap_or(0),
                });
            }
            return Err(ProviderError::from_api_response(status, message));
        }

        response
            .json::<ApiResponse>()
            .await
            .map_err(|e| ProviderError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl LlmProvider for HttpLlmProvider {
    fn id(&self) -> &str {
        "http"
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let timeout = request
            .timeout_seconds
            .map(Duration::from_secs)
            .unwrap_or(self.config.default_timeout);
        let started = Instant::now();

        let api_response = tokio::time::timeout(timeout, self.post_completion(&request))
            .await
            .map_err(|_| ProviderError::Timeout(timeout.as_secs()))??;

        let latency_ms = started.elapsed().as_millis() as u64;
        let choice = api_response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| ProviderError::MalformedResponse("no choices".into()))?;

        let finish_reason = map_finish_reason(choice.finish_reason.as_deref());
        let usage = api_response
            .usage
            .map(|u| Usage {
                prompt_tokens: u.prompt_tokens,
                completion_tokens: u.completion_tokens,
                total_tokens: u.total_tokens,
            })
            .unwrap_or_default();

        debug!(model = %api_response.model, latency_ms, "completion finished");
        Ok(CompletionResponse {
            id: api_response.id,
            model: api_response.model,
            content: choice.message.content,
            tool_calls: choice.message.tool_calls,
            usage,
            finish_reason,
            latency_ms,
        })
    }

    async fn health_check(&self) -> bool {
        let url = format!("{}/models", self.config.base_url.trim_end_matches('/'));
        let probe = self
            .client
            .get(url)
            .bearer_auth(&self.config.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await;
        matches!(probe, Ok(response) if response.status().is_success())
    }
}

/// Map a provider finish reason into the closed port set. Anything
/// unrecognized counts as a plain stop.
fn map_finish_reason(reason: Option<&str>) -> FinishReason {
    match reason {
        Some("tool_calls") | Some("function_call") => FinishReason::ToolCalls,
        Some("length") | Some("max_tokens") => FinishReason::Length,
        Some("content_filter") => FinishReason::ContentFilter,
        _ => FinishReason::Stop,
    }
}

#[cfg(test)]
#[path = "provider_tests.rs"]
mod tests;
