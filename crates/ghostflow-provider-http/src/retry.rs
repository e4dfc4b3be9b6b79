//! Retrying provider wrapper.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::sleep;
use tracing::warn;

use ghostflow_protocols::{CompletionRequest, CompletionResponse, LlmProvider, ProviderError};

/// Retry configuration.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts.
    pub max_retries: u32,
    /// Base delay between retries.
    pub base_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Exponential backoff multiplier.
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Delay for a given attempt, capped at `max_delay`.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay =
            self.base_delay.as_millis() as f64 * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_millis(delay.min(self.max_delay.as_millis() as f64) as u64)
    }
}

/// Wraps any provider with retry on retryable errors. Rate limits wait out
/// the provider's `Retry-After` rather than the backoff schedule.
pub struct RetryProvider {
    inner: Arc<dyn LlmProvider>,
    config: RetryConfig,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn LlmProvider>, config: RetryConfig) -> Self {
        Self { inner, config }
    }

    pub fn inner(&self) -> &Arc<dyn LlmProvider> {
        &self.inner
    }
}

#[async_trait]
impl LlmProvider for RetryProvider {
    fn id(&self) -> &str {
        self.inner.id()
    }

    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, ProviderError> {
        let mut attempt = 0u32;
        loop {
            match self.inner.complete(request.clone()).await {
                Ok(response) => return Ok(response),
                Err(error) => {
                    if !error.is_retryable() || attempt >= self.config.max_retries {
                        return Err(error);
                    }
                    let delay = match &error {
                        ProviderError::RateLimited { retry_after_seconds }
                            if *retry_after_seconds > 0 =>
                        {
                            Duration::from_secs(*retry_after_seconds)
                        }
                        _ => self.config.delay_for_attempt(attempt),
                    };
                    warn!(
                        attempt = attempt + 1,
                        max = self.config.max_retries,
                        %error,
                        ?delay,
                        "provider error, retrying"
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn health_check(&self) -> bool {
        self.inner.health_check().await
    }
}
