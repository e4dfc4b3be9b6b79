//! Transmitter configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Tunables for the transmitter. Every field is overridable at runtime via
/// [`crate::EventTransmitter::configure`].
#[derive(Debug, Clone)]
pub struct TransmitterConfig {
    /// Ingestion endpoint. Without one, batches go straight to the failed
    /// queue (offline mode).
    pub endpoint: Option<String>,

    /// Bearer token for the ingestion service.
    pub api_key: String,

    /// Events per batch.
    pub max_batch_size: usize,

    /// Interval of the background flush timer.
    pub flush_interval: Duration,

    /// Retry budget per batch for transient failures.
    pub max_retries: u32,

    /// Base delay for exponential backoff.
    pub retry_base: Duration,

    /// Events allowed per rolling minute; the overflow valve.
    pub per_minute_limit: u32,

    /// Where failed batches are persisted across restarts.
    pub durable_path: Option<PathBuf>,
}

impl Default for TransmitterConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            api_key: String::new(),
            max_batch_size: 100,
            flush_interval: Duration::from_millis(10_000),
            max_retries: 3,
            retry_base: Duration::from_millis(1_000),
            per_minute_limit: 1_000,
            durable_path: None,
        }
    }
}

impl TransmitterConfig {
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = api_key.into();
        self
    }

    pub fn with_durable_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.durable_path = Some(path.into());
        self
    }
}
