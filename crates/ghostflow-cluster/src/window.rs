//! Sliding-window sequence extraction.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;

use ghostflow_protocols::{SecureEvent, StoredEvent};

/// Maximum events per window.
pub const WINDOW_SIZE: usize = 50;
/// Windows shorter than this are discarded.
pub const MIN_SEQUENCE_LEN: usize = 3;

/// One windowed slice of a session, with its mean-pooled embedding.
#[derive(Debug, Clone)]
pub struct EventSequence {
    pub session_fingerprint: String,
    pub events: Vec<SecureEvent>,
    pub embedding: Vec<f32>,
    pub timestamp: DateTime<Utc>,
}

/// Group events by session, restore canonical order, and slide windows.
///
/// Batches can arrive out of order after transmitter retries; the sequence
/// number is the source of truth for intra-session order, so each group is
/// re-sorted before windowing. Windows step by one, start at every index up
/// to `len - MIN_SEQUENCE_LEN`, and are capped at [`WINDOW_SIZE`] events.
pub fn extract_sequences(rows: &[StoredEvent]) -> Vec<EventSequence> {
    // BTreeMap keeps group order deterministic across runs.
    let mut groups: BTreeMap<&str, Vec<&SecureEvent>> = BTreeMap::new();
    for row in rows {
        groups
            .entry(row.event.session_fingerprint.as_str())
            .or_default()
            .push(&row.event);
    }

    let mut sequences = Vec::new();
    for (fingerprint, mut events) in groups {
        events.sort_by_key(|e| e.sequence_number);
        if events.len() < MIN_SEQUENCE_LEN {
            continue;
        }
        for start in 0..=events.len() - MIN_SEQUENCE_LEN {
            let end = (start + WINDOW_SIZE).min(events.len());
            let window: Vec<SecureEvent> = events[start..end].iter().map(|e| (*e).clone()).collect();
            if window.len() < MIN_SEQUENCE_LEN {
                continue;
            }
            let embedding = mean_embedding(&window);
            let timestamp = parse_bucket(&window[0].timestamp_bucket);
            sequences.push(EventSequence {
                session_fingerprint: fingerprint.to_string(),
                events: window,
                embedding,
                timestamp,
            });
        }
    }
    sequences
}

/// Element-wise mean of the windows' intent vectors, ignoring empty ones.
fn mean_embedding(events: &[SecureEvent]) -> Vec<f32> {
    let vectors: Vec<&Vec<f32>> = events
        .iter()
        .map(|e| &e.intent_vector)
        .filter(|v| !v.is_empty())
        .collect();
    let Some(first) = vectors.first() else {
        return Vec::new();
    };
    let dims = first.len();
    let mut mean = vec![0.0f32; dims];
    let mut counted = 0usize;
    for vector in &vectors {
        if vector.len() != dims {
            continue;
        }
        for (slot, value) in mean.iter_mut().zip(vector.iter()) {
            *slot += value;
        }
        counted += 1;
    }
    if counted > 0 {
        for slot in &mut mean {
            *slot /= counted as f32;
        }
    }
    mean
}

fn parse_bucket(bucket: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(bucket)
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or(DateTime::UNIX_EPOCH)
}

#[cfg(test)]
#[path = "window_tests.rs"]
mod tests;
