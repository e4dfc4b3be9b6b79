//! Confidence scoring and fusion.

use std::collections::HashSet;

use crate::density::Cluster;

/// Patterns below this combined confidence are dropped.
pub const REVIEW_THRESHOLD: f32 = 0.70;
/// Patterns at or above this are auto-suggested rather than queued for
/// review.
pub const AUTO_SUGGEST_THRESHOLD: f32 = 0.85;

/// Statistical confidence of a cluster:
/// `0.3 * min(n/10, 1) + 0.4 * (1 - (unique - 1)/n) + 0.3 * mean_confidence`
/// where `unique` counts distinct label sequences among the members.
pub fn statistical_score(cluster: &Cluster) -> f32 {
    let n = cluster.members.len();
    if n == 0 {
        return 0.0;
    }

    let size_score = (n as f32 / 10.0).min(1.0);

    let unique: usize = cluster
        .members
        .iter()
        .map(|member| {
            member
                .events
                .iter()
                .map(|e| e.intent_label.as_str())
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<HashSet<String>>()
        .len();
    let consistency = 1.0 - (unique.saturating_sub(1)) as f32 / n as f32;

    let (sum, count) = cluster
        .members
        .iter()
        .flat_map(|m| m.events.iter())
        .fold((0.0f32, 0usize), |(sum, count), e| (sum + e.intent_confidence, count + 1));
    let mean_confidence = if count > 0 { sum / count as f32 } else { 0.0 };

    0.3 * size_score + 0.4 * consistency + 0.3 * mean_confidence
}

/// Combine statistical and model confidence, rounded to two decimals. A
/// missing model confidence counts as 0.5.
pub fn fuse(statistical: f32, llm: Option<f32>) -> f32 {
    let combined = 0.6 * statistical + 0.4 * llm.unwrap_or(0.5);
    (combined * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::window::EventSequence;
    use ghostflow_protocols::{EventType, IntentClass, SecureEvent};

    fn event(label: IntentClass, confidence: f32) -> SecureEvent {
        SecureEvent {
            session_fingerprint: "s".into(),
            timestamp_bucket: "2026-08-01T10:00:00Z".into(),
            intent_vector: vec![1.0, 0.0],
            structural_hash: "00000000".into(),
            org_id: "o1".into(),
            event_type: EventType::UserInteraction,
            intent_label: label,
            intent_confidence: confidence,
            element_signature: None,
            sequence_number: 1,
        }
    }

    fn member(labels: &[IntentClass]) -> EventSequence {
        EventSequence {
            session_fingerprint: "s".into(),
            events: labels.iter().map(|l| event(*l, 0.9)).collect(),
            embedding: vec![1.0, 0.0],
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_uniform_cluster_scores_high() {
        let labels = [IntentClass::Navigation, IntentClass::DataEntry];
        let cluster = Cluster {
            members: (0..10).map(|_| member(&labels)).collect(),
            centroid: vec![1.0, 0.0],
        };
        let score = statistical_score(&cluster);
        // 0.3 * 1.0 + 0.4 * 1.0 + 0.3 * 0.9
        assert!((score - 0.97).abs() < 1e-5, "score {score}");
    }

    #[test]
    fn test_diverse_cluster_loses_consistency() {
        let cluster = Cluster {
            members: vec![
                member(&[IntentClass::Navigation]),
                member(&[IntentClass::DataEntry]),
                member(&[IntentClass::Research]),
            ],
            centroid: vec![1.0, 0.0],
        };
        let score = statistical_score(&cluster);
        // consistency term: 1 - (3-1)/3 = 1/3
        assert!(score < 0.7, "score {score}");
    }

    #[test]
    fn test_fuse_defaults_missing_llm_confidence() {
        assert_eq!(fuse(1.0, None), 0.80);
        assert_eq!(fuse(0.9, Some(0.9)), 0.90);
    }

    #[test]
    fn test_fuse_rounds_two_decimals() {
        let fused = fuse(0.777, Some(0.888));
        assert_eq!(fused, (fused * 100.0).round() / 100.0);
        assert_eq!(fuse(0.777, Some(0.888)), 0.82);
    }

    #[test]
    fn test_empty_cluster_scores_zero() {
        let cluster = Cluster { members: vec![], centroid: vec![] };
        assert_eq!(statistical_score(&cluster), 0.0);
    }
}
