//! The event transmitter.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{SecondsFormat, Utc};
use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use ghostflow_protocols::{SecureEvent, SecureEventBatch};

use crate::config::TransmitterConfig;
use crate::durable::DurableQueue;

/// Failed batches kept in memory and on disk; older ones are shed first.
const FAILED_QUEUE_CAP: usize = 10;

/// Counters exposed by [`EventTransmitter::stats`].
#[derive(Debug, Clone, Default, Serialize)]
pub struct TransmitterStats {
    pub total_sent: u64,
    pub total_failed: u64,
    pub total_dropped: u64,
    pub total_batches: u64,
    pub buffer_size: usize,
    pub failed_batch_count: usize,
    pub events_this_minute: u32,
}

#[derive(Debug)]
struct TransmitterState {
    buffer: Vec<SecureEvent>,
    failed: VecDeque<SecureEventBatch>,
    minute_started: Instant,
    events_this_minute: u32,
    total_sent: u64,
    total_failed: u64,
    total_dropped: u64,
    total_batches: u64,
}

impl TransmitterState {
    fn new() -> Self {
        Self {
            buffer: Vec::new(),
            failed: VecDeque::new(),
            minute_started: Instant::now(),
            events_this_minute: 0,
            total_sent: 0,
            total_failed: 0,
            total_dropped: 0,
            total_batches: 0,
        }
    }

    fn roll_minute(&mut self) {
        if self.minute_started.elapsed() >= Duration::from_secs(60) {
            self.minute_started = Instant::now();
            self.events_this_minute = 0;
        }
    }

    fn push_failed(&mut self, batch: SecureEventBatch) {
        self.failed.push_back(batch);
        while self.failed.len() > FAILED_QUEUE_CAP {
            self.failed.pop_front();
        }
    }
}

/// Batches, rate-limits, retries, and persists secure events.
///
/// The transmitter is the exclusive owner of its buffer, failed queue, and
/// counters; `enqueue` is constant-time and never suspends, while `flush`
/// and the send path may sleep on network I/O and backoff.
pub struct EventTransmitter {
    config: Mutex<TransmitterConfig>,
    state: Mutex<TransmitterState>,
    durable: Mutex<DurableQueue>,
    flushing: AtomicBool,
    flush_signal: Notify,
    device_fingerprint: String,
    client: reqwest::Client,
    flush_task: Mutex<Option<JoinHandle<()>>>,
}

impl EventTransmitter {
    pub fn new(device_fingerprint: impl Into<String>, config: TransmitterConfig) -> Self {
        let durable = DurableQueue::new(config.durable_path.clone());
        Self {
            config: Mutex::new(config),
            state: Mutex::new(TransmitterState::new()),
            durable: Mutex::new(durable),
            flushing: AtomicBool::new(false),
            flush_signal: Notify::new(),
            device_fingerprint: device_fingerprint.into(),
            client: reqwest::Client::new(),
            flush_task: Mutex::new(None),
        }
    }

    /// Restore persisted failed batches and start the flush task, which
    /// fires on the interval timer and whenever the buffer fills.
    pub fn start(self: Arc<Self>) {
        let restored = self.durable.lock().restore();
        if !restored.is_empty() {
            info!(count = restored.len(), "restored failed batches from durable storage");
            let mut state = self.state.lock();
            for batch in restored {
                state.push_failed(batch);
            }
        }

        let interval = self.config.lock().flush_interval;
        let transmitter = Arc::clone(&self);
        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {}
                    _ = transmitter.flush_signal.notified() => {}
                }
                transmitter.flush().await;
            }
        });
        *self.flush_task.lock() = Some(handle);
    }

    /// Replace the configuration. Takes effect on the next flush; the timer
    /// interval applies after a restart.
    pub fn configure(&self, config: TransmitterConfig) {
        *self.durable.lock() = DurableQueue::new(config.durable_path.clone());
        *self.config.lock() = config;
    }

    /// Append an event to the buffer. Returns false when the per-minute
    /// budget is exhausted and the event was dropped.
    ///
    /// Constant-time, never suspends, and never reorders events already
    /// buffered. A full buffer wakes the flush task.
    pub fn enqueue(&self, event: SecureEvent) -> bool {
        let should_flush;
        {
            let config = self.config.lock();
            let mut state = self.state.lock();
            state.roll_minute();
            if state.events_this_minute >= config.per_minute_limit {
                state.total_dropped += 1;
                debug!(dropped = state.total_dropped, "per-minute budget exhausted, dropping");
                return false;
            }
            state.buffer.push(event);
            should_flush = state.buffer.len() >= config.max_batch_size;
        }

        if should_flush {
            self.flush_signal.notify_one();
        }
        true
    }

    /// Send up to one batch from the buffer, then drain the failed queue.
    /// A no-op when a flush is already in flight or the buffer is empty.
    pub async fn flush(&self) {
        if self.flushing.swap(true, Ordering::AcqRel) {
            return;
        }

        let taken = {
            let config = self.config.lock();
            let mut state = self.state.lock();
            if state.buffer.is_empty() {
                None
            } else {
                let take = state.buffer.len().min(config.max_batch_size);
                Some(state.buffer.drain(..take).collect::<Vec<_>>())
            }
        };

        if let Some(events) = taken {
            let parked = self.state.lock().failed.len();
            let batch = self.wrap(events);
            // Only drain the backlog over a connection that just worked,
            // and only the batches that were parked before this flush.
            if self.send_batch(batch).await {
                self.drain_failed(parked).await;
            }
        }

        self.flushing.store(false, Ordering::Release);
    }

    /// Cancel the flush timer, force one final flush, and persist whatever
    /// is still failed.
    pub async fn shutdown(&self) {
        if let Some(handle) = self.flush_task.lock().take() {
            handle.abort();
        }
        self.flush().await;
        let snapshot: Vec<SecureEventBatch> = {
            let state = self.state.lock();
            state.failed.iter().cloned().collect()
        };
        self.durable.lock().persist(&snapshot);
        info!(failed = snapshot.len(), "transmitter shut down");
    }

    pub fn stats(&self) -> TransmitterStats {
        let mut state = self.state.lock();
        state.roll_minute();
        TransmitterStats {
            total_sent: state.total_sent,
            total_failed: state.total_failed,
            total_dropped: state.total_dropped,
            total_batches: state.total_batches,
            buffer_size: state.buffer.len(),
            failed_batch_count: state.failed.len(),
            events_this_minute: state.events_this_minute,
        }
    }

    fn wrap(&self, events: Vec<SecureEvent>) -> SecureEventBatch {
        SecureEventBatch {
            events,
            device_fingerprint: self.device_fingerprint.clone(),
            batch_id: Uuid::new_v4().to_string(),
            sent_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        }
    }

    /// One attempt per previously parked batch; anything still failing goes
    /// back on the queue inside `send_batch`.
    async fn drain_failed(&self, limit: usize) {
        for _ in 0..limit {
            let Some(batch) = self.state.lock().failed.pop_front() else {
                break;
            };
            self.send_batch(batch).await;
        }
    }

    /// Deliver one batch: success counts it, 429 waits out `Retry-After`,
    /// 5xx and network errors back off exponentially within the retry
    /// budget, everything else parks the batch in the failed queue.
    async fn send_batch(&self, batch: SecureEventBatch) -> bool {
        let (endpoint, api_key, max_retries, retry_base) = {
            let config = self.config.lock();
            (
                config.endpoint.clone(),
                config.api_key.clone(),
                config.max_retries,
                config.retry_base,
            )
        };

        let Some(endpoint) = endpoint else {
            self.park_failed(batch, "no endpoint configured");
            return false;
        };

        let mut retry = 0u32;
        loop {
            let response = self
                .client
                .post(&endpoint)
                .bearer_auth(&api_key)
                .header("X-Ghost-Batch-Id", &batch.batch_id)
                .header("X-Ghost-Device", &batch.device_fingerprint)
                .json(&batch)
                .send()
                .await;

            match response {
                Ok(resp) if matches!(resp.status().as_u16(), 200 | 202) => {
                    let mut state = self.state.lock();
                    state.roll_minute();
                    state.total_sent += batch.events.len() as u64;
                    state.total_batches += 1;
                    state.events_this_minute += batch.events.len() as u32;
                    debug!(batch_id = %batch.batch_id, events = batch.events.len(), "batch accepted");
                    return true;
                }
                Ok(resp) if resp.status().as_u16() == 429 => {
                    let wait = resp
                        .headers()
                        .get("Retry-After")
                        .and_then(|v| v.to_str().ok())
                        .and_then(|v| v.parse::<u64>().ok())
                        .unwrap_or(1);
                    warn!(batch_id = %batch.batch_id, wait, "ingest rate limited");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                    // Rate limiting does not consume the retry budget.
                }
                Ok(resp) if resp.status().is_server_error() && retry < max_retries => {
                    let delay = retry_base * 2u32.saturating_pow(retry);
                    warn!(
                        batch_id = %batch.batch_id,
                        status = resp.status().as_u16(),
                        retry,
                        "server error, backing off"
                    );
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Ok(resp) => {
                    let status = resp.status().as_u16();
                    self.park_failed(batch, &format!("status {status}"));
                    return false;
                }
                Err(error) if retry < max_retries => {
                    let delay = retry_base * 2u32.saturating_pow(retry);
                    warn!(batch_id = %batch.batch_id, %error, retry, "network error, backing off");
                    tokio::time::sleep(delay).await;
                    retry += 1;
                }
                Err(error) => {
                    self.park_failed(batch, &error.to_string());
                    return false;
                }
            }
        }
    }

    fn park_failed(&self, batch: SecureEventBatch, reason: &str) {
        warn!(batch_id = %batch.batch_id, reason, "parking batch in failed queue");
        let snapshot: Vec<SecureEventBatch> = {
            let mut state = self.state.lock();
            state.total_failed += batch.events.len() as u64;
            state.push_failed(batch);
            state.failed.iter().cloned().collect()
        };
        self.durable.lock().persist(&snapshot);
    }
}

#[cfg(test)]
#[path = "transmitter_tests.rs"]
mod tests;
