//! Greedy density clustering over sequence embeddings.

use chrono::Duration;
use std::collections::HashSet;

use crate::window::EventSequence;

/// Cosine similarity floor for cluster membership.
pub const SIMILARITY_THRESHOLD: f32 = 0.75;
/// Members must fall within this temporal window of the seed.
pub const TEMPORAL_WINDOW_MINUTES: i64 = 30;
/// Minimum distinct sessions before a cluster is kept.
pub const MIN_CLUSTER_SIZE: usize = 3;

/// A cluster of similar sequences.
#[derive(Debug, Clone)]
pub struct Cluster {
    pub members: Vec<EventSequence>,
    pub centroid: Vec<f32>,
}

impl Cluster {
    /// Distinct session fingerprints among the members. A workflow recurs
    /// when separate sessions produced it, not when one session yields
    /// several overlapping windows.
    pub fn occurrences(&self) -> usize {
        self.members
            .iter()
            .map(|m| m.session_fingerprint.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Cosine similarity; zero-length or mismatched vectors score 0.
pub fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.is_empty() || a.len() != b.len() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

/// Single-pass greedy clustering: each unassigned sequence seeds a cluster
/// and absorbs every later unassigned sequence within the similarity and
/// temporal bounds. Centroids are recomputed as the member mean afterwards.
/// Clusters spanning fewer than [`MIN_CLUSTER_SIZE`] sessions are dropped.
pub fn cluster_sequences(sequences: Vec<EventSequence>) -> Vec<Cluster> {
    let window = Duration::minutes(TEMPORAL_WINDOW_MINUTES);
    let mut assigned = vec![false; sequences.len()];
    let mut clusters = Vec::new();

    for i in 0..sequences.len() {
        if assigned[i] {
            continue;
        }
        assigned[i] = true;
        let seed_embedding = sequences[i].embedding.clone();
        let seed_timestamp = sequences[i].timestamp;
        let mut members = vec![sequences[i].clone()];

        for j in (i + 1)..sequences.len() {
            if assigned[j] {
                continue;
            }
            let similar = cosine(&seed_embedding, &sequences[j].embedding) >= SIMILARITY_THRESHOLD;
            let near = (seed_timestamp - sequences[j].timestamp).abs() <= window;
            if similar && near {
                assigned[j] = true;
                members.push(sequences[j].clone());
            }
        }

        let centroid = centroid_of(&members);
        clusters.push(Cluster { members, centroid });
    }

    clusters.retain(|c| c.occurrences() >= MIN_CLUSTER_SIZE);
    clusters
}

fn centroid_of(members: &[EventSequence]) -> Vec<f32> {
    let Some(first) = members.iter().find(|m| !m.embedding.is_empty()) else {
        return Vec::new();
    };
    let dims = first.embedding.len();
    let mut centroid = vec![0.0f32; dims];
    let mut counted = 0usize;
    for member in members {
        if member.embedding.len() != dims {
            continue;
        }
        for (slot, value) in centroid.iter_mut().zip(member.embedding.iter()) {
            *slot += value;
        }
        counted += 1;
    }
    if counted > 0 {
        for slot in &mut centroid {
            *slot /= counted as f32;
        }
    }
    centroid
}

#[cfg(test)]
#[path = "density_tests.rs"]
mod tests;
