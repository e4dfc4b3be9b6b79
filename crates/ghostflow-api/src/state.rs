//! Application state.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use ghostflow_cluster::PatternDetector;
use ghostflow_executor::ExecutionEngine;
use ghostflow_protocols::LlmProvider;
use ghostflow_store::GovernanceStore;

use crate::rate_limit::DeviceRateLimiter;

/// Shared state behind every handler.
pub struct AppState {
    pub store: Arc<dyn GovernanceStore>,
    pub provider: Arc<dyn LlmProvider>,
    pub detector: Arc<PatternDetector>,
    pub engine: Arc<ExecutionEngine>,
    pub rate_limiter: DeviceRateLimiter,
    start_time: Instant,
    request_count: AtomicU64,
}

impl AppState {
    pub fn new(store: Arc<dyn GovernanceStore>, provider: Arc<dyn LlmProvider>) -> Self {
        let detector = Arc::new(PatternDetector::new(store.clone(), provider.clone()));
        let engine = Arc::new(ExecutionEngine::new(store.clone(), provider.clone()));
        Self {
            store,
            provider,
            detector,
            engine,
            rate_limiter: DeviceRateLimiter::default(),
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
        }
    }

    pub fn with_rate_limit(mut self, limit: u32) -> Self {
        self.rate_limiter = DeviceRateLimiter::new(limit);
        self
    }

    pub fn uptime(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    pub fn request_count(&self) -> u64 {
        self.request_count.load(Ordering::Relaxed)
    }

    pub fn increment_requests(&self) {
        self.request_count.fetch_add(1, Ordering::Relaxed);
    }
}
