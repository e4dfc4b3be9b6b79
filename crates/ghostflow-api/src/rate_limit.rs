//! Per-device ingestion rate limiting.

use dashmap::DashMap;
use std::time::{Duration, Instant};

/// Window length for the device budget.
const WINDOW: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy)]
struct Window {
    started: Instant,
    count: u32,
}

/// Counts accepted events per device key over rolling 60-second windows.
///
/// The state is process-local but partitioned by device key; a multi-
/// instance deployment swaps this for a shared counter with the same
/// interface.
#[derive(Debug)]
pub struct DeviceRateLimiter {
    windows: DashMap<String, Window>,
    limit: u32,
}

impl DeviceRateLimiter {
    /// Default events-per-minute budget per device.
    pub const DEFAULT_LIMIT: u32 = 1_000;

    pub fn new(limit: u32) -> Self {
        Self {
            windows: DashMap::new(),
            limit,
        }
    }

    /// Whether `device` may ingest `events` more events this minute. On
    /// acceptance the budget is consumed; on rejection nothing changes.
    pub fn try_accept(&self, device: &str, events: u32) -> bool {
        let now = Instant::now();
        let mut entry = self.windows.entry(device.to_string()).or_insert(Window {
            started: now,
            count: 0,
        });
        if now.duration_since(entry.started) >= WINDOW {
            entry.started = now;
            entry.count = 0;
        }
        if entry.count >= self.limit {
            return false;
        }
        entry.count += events;
        true
    }

    /// Drop windows idle past expiry; called opportunistically.
    pub fn evict_stale(&self) {
        let now = Instant::now();
        self.windows
            .retain(|_, window| now.duration_since(window.started) < WINDOW);
    }

    /// Current count for a device, for introspection.
    pub fn current(&self, device: &str) -> u32 {
        self.windows.get(device).map(|w| w.count).unwrap_or(0)
    }
}

impl Default for DeviceRateLimiter {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LIMIT)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_is_consumed_then_blocked() {
        let limiter = DeviceRateLimiter::new(1_000);
        assert!(limiter.try_accept("devA", 1_000));
        // The 1001st event is rejected.
        assert!(!limiter.try_accept("devA", 1));
        assert_eq!(limiter.current("devA"), 1_000);
    }

    #[test]
    fn test_devices_are_partitioned() {
        let limiter = DeviceRateLimiter::new(10);
        assert!(limiter.try_accept("devA", 10));
        assert!(!limiter.try_accept("devA", 1));
        assert!(limiter.try_accept("devB", 5));
    }

    #[test]
    fn test_rejection_does_not_consume() {
        let limiter = DeviceRateLimiter::new(5);
        assert!(limiter.try_accept("devA", 5));
        assert!(!limiter.try_accept("devA", 3));
        assert_eq!(limiter.current("devA"), 5);
    }

    #[test]
    fn test_evict_stale_keeps_fresh_windows() {
        let limiter = DeviceRateLimiter::new(5);
        limiter.try_accept("devA", 1);
        limiter.evict_stale();
        assert_eq!(limiter.current("devA"), 1);
    }
}
