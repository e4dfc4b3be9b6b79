//! LLM provider trait definition.

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse};
use crate::error::ProviderError;

/// Core trait for LLM providers.
///
/// The pipeline treats the model as a black box behind this port: the
/// clustering engine and the execution engine take an `Arc<dyn LlmProvider>`
/// at construction, and tests substitute a scripted stub.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Returns the provider ID.
    fn id(&self) -> &str;

    /// Generate a completion. Implementations must honor the request's
    /// timeout and map provider finish reasons into [`super::FinishReason`].
    async fn complete(&self, request: CompletionRequest)
        -> Result<CompletionResponse, ProviderError>;

    /// Cheap liveness probe.
    async fn health_check(&self) -> bool;
}
