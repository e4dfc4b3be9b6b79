//! Detected workflow patterns.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::intent::IntentClass;

/// Review status of a detected pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternStatus {
    NeedsReview,
    AutoSuggested,
    Approved,
    Dismissed,
}

/// A clustered, LLM-named, confidence-scored workflow candidate.
///
/// Produced by the clustering engine; transitions to `Approved` exactly
/// once, producing a ghost.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectedPattern {
    /// Deterministic identity derived from the org, the sorted intent
    /// sequence, and the sorted structural hashes, so re-detection over the
    /// same events upserts rather than duplicates.
    pub id: String,
    pub org_id: String,
    pub intent_sequence: Vec<IntentClass>,
    pub structural_hashes: Vec<String>,
    /// Number of clustered occurrences; never below the cluster minimum.
    pub occurrences: u32,
    pub confidence: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub suggested_description: Option<String>,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub status: PatternStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_names() {
        assert_eq!(
            serde_json::to_string(&PatternStatus::NeedsReview).unwrap(),
            "\"needs_review\""
        );
        assert_eq!(
            serde_json::to_string(&PatternStatus::AutoSuggested).unwrap(),
            "\"auto_suggested\""
        );
    }
}
