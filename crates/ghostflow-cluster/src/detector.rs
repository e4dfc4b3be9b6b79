//! The pattern detector: orchestrates windowing, clustering, lifting, and
//! scoring for one org.

use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info, warn};

use ghostflow_protocols::{
    DetectedPattern, IntentClass, LlmProvider, PatternStatus, StoreError,
};
use ghostflow_store::{GovernanceStore, OrgScope};

use crate::density::cluster_sequences;
use crate::lift::{lift, LiftedPattern};
use crate::score::{fuse, statistical_score, AUTO_SUGGEST_THRESHOLD, REVIEW_THRESHOLD};
use crate::window::{extract_sequences, MIN_SEQUENCE_LEN, WINDOW_SIZE};

/// Detector tunables; defaults are the contract values.
#[derive(Debug, Clone)]
pub struct DetectorConfig {
    /// Events fetched per run: `fetch_multiplier * WINDOW_SIZE`.
    pub fetch_multiplier: usize,
    /// Clusters lifted through the LLM per run.
    pub max_lifted_clusters: usize,
}

impl Default for DetectorConfig {
    fn default() -> Self {
        Self {
            fetch_multiplier: 5,
            max_lifted_clusters: 5,
        }
    }
}

/// Temporal Intent Clustering over one org's recent events.
pub struct PatternDetector {
    store: Arc<dyn GovernanceStore>,
    provider: Arc<dyn LlmProvider>,
    config: DetectorConfig,
}

impl PatternDetector {
    pub fn new(store: Arc<dyn GovernanceStore>, provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            store,
            provider,
            config: DetectorConfig::default(),
        }
    }

    pub fn with_config(mut self, config: DetectorConfig) -> Self {
        self.config = config;
        self
    }

    /// Run one detection cycle. Store failures propagate; LLM failures are
    /// isolated per cluster. Fewer than three events yields an empty result.
    ///
    /// Idempotent for a given set of events: pattern identity derives from
    /// the org and the cluster's sorted label and hash sets, so re-running
    /// over the same batch upserts the same rows.
    pub async fn detect(
        &self,
        org_id: &str,
        trigger: &str,
    ) -> Result<Vec<DetectedPattern>, StoreError> {
        let scope = OrgScope::tenant(org_id)?;
        let fetch = self.config.fetch_multiplier * WINDOW_SIZE;
        let rows = self.store.recent_events(&scope, org_id, fetch).await?;
        if rows.len() < MIN_SEQUENCE_LEN {
            debug!(org_id, events = rows.len(), "not enough events to window");
            return Ok(Vec::new());
        }

        let sequences = extract_sequences(&rows);
        let clusters = cluster_sequences(sequences);
        info!(org_id, trigger, clusters = clusters.len(), "clustering complete");

        let mut patterns = Vec::new();
        for cluster in clusters.iter().take(self.config.max_lifted_clusters) {
            let lifted = match lift(self.provider.as_ref(), cluster).await {
                Ok(lifted) => lifted,
                Err(error) => {
                    warn!(org_id, %error, "skipping cluster: lift failed");
                    continue;
                }
            };

            let statistical = statistical_score(cluster);
            let confidence = fuse(statistical, lifted.confidence);
            if confidence < REVIEW_THRESHOLD {
                debug!(org_id, confidence, "cluster below review threshold");
                continue;
            }

            let pattern = self.build_pattern(org_id, cluster, &lifted, confidence);
            let stored = self.store.upsert_pattern(&scope, pattern).await?;
            patterns.push(stored);
        }

        info!(org_id, found = patterns.len(), "detection cycle finished");
        Ok(patterns)
    }

    fn build_pattern(
        &self,
        org_id: &str,
        cluster: &crate::density::Cluster,
        lifted: &LiftedPattern,
        confidence: f32,
    ) -> DetectedPattern {
        let mut intent_sequence: Vec<IntentClass> = Vec::new();
        let mut seen_labels = HashSet::new();
        let mut structural_hashes: Vec<String> = Vec::new();
        let mut seen_hashes = HashSet::new();
        for member in &cluster.members {
            for event in &member.events {
                if seen_labels.insert(event.intent_label) {
                    intent_sequence.push(event.intent_label);
                }
                if seen_hashes.insert(event.structural_hash.clone()) {
                    structural_hashes.push(event.structural_hash.clone());
                }
            }
        }

        let first_seen = cluster.members.iter().map(|m| m.timestamp).min().unwrap_or_else(Utc::now);
        let last_seen = cluster.members.iter().map(|m| m.timestamp).max().unwrap_or_else(Utc::now);

        let status = if confidence >= AUTO_SUGGEST_THRESHOLD {
            PatternStatus::AutoSuggested
        } else {
            PatternStatus::NeedsReview
        };

        let now = Utc::now();
        DetectedPattern {
            id: pattern_id(org_id, &intent_sequence, &structural_hashes),
            org_id: org_id.to_string(),
            intent_sequence,
            structural_hashes,
            occurrences: cluster.occurrences() as u32,
            confidence,
            suggested_name: Some(lifted.name.clone()),
            suggested_description: (!lifted.description.is_empty())
                .then(|| lifted.description.clone()),
            first_seen,
            last_seen,
            status,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Deterministic pattern identity from the org and the cluster's sorted
/// label and hash sets.
fn pattern_id(org_id: &str, labels: &[IntentClass], hashes: &[String]) -> String {
    let mut sorted_labels: Vec<&str> = labels.iter().map(IntentClass::as_str).collect();
    sorted_labels.sort_unstable();
    let mut sorted_hashes: Vec<&str> = hashes.iter().map(String::as_str).collect();
    sorted_hashes.sort_unstable();
    let key = format!("{org_id}|{}|{}", sorted_labels.join(","), sorted_hashes.join(","));
    format!("pat-{:016x}", fnv1a_64(key.as_bytes()))
}

fn fnv1a_64(data: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in data {
        hash ^= u64::from(*byte);
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

#[cfg(test)]
#[path = "detector_tests.rs"]
mod tests;
