//! The privacy boundary record and its transport batch.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::event::EventType;
use super::intent::IntentClass;

/// The record that crosses the device-to-cloud boundary.
///
/// Invariant: contains no plaintext URL, no user text, no credential. The
/// sequence number strictly increases within one session fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureEvent {
    /// 64-char hex HMAC-SHA256 over device, user, and 15-minute bucket.
    pub session_fingerprint: String,

    /// ISO-8601 timestamp rounded to a 5-minute boundary after pre-bucket
    /// noise.
    pub timestamp_bucket: String,

    /// 128-dimensional L2-normalized, Gaussian-perturbed intent vector.
    pub intent_vector: Vec<f32>,

    /// 8-hex FNV-1a over the DOM path and tag name.
    pub structural_hash: String,

    pub org_id: String,

    pub event_type: EventType,

    pub intent_label: IntentClass,

    pub intent_confidence: f32,

    /// `tag[role]@last3PathSegments`, when an element was involved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_signature: Option<String>,

    /// Monotone within one session fingerprint.
    pub sequence_number: u64,
}

/// Transport batch posted by the transmitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SecureEventBatch {
    pub events: Vec<SecureEvent>,
    pub device_fingerprint: String,
    pub batch_id: String,
    pub sent_at: String,
}

/// A secure event as persisted by the ingestion service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredEvent {
    pub id: uuid::Uuid,
    #[serde(flatten)]
    pub event: SecureEvent,
    pub device_fingerprint: String,
    pub batch_id: String,
    pub ingested_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_event() -> SecureEvent {
        SecureEvent {
            session_fingerprint: "ab".repeat(32),
            timestamp_bucket: "2026-08-01T10:05:00Z".into(),
            intent_vector: vec![0.0; 128],
            structural_hash: "1a2b3c4d".into(),
            org_id: "o1".into(),
            event_type: EventType::UserInteraction,
            intent_label: IntentClass::DataEntry,
            intent_confidence: 0.9,
            element_signature: Some("input@form>div>input".into()),
            sequence_number: 7,
        }
    }

    #[test]
    fn test_secure_event_wire_shape_is_camel_case() {
        let json = serde_json::to_value(sample_event()).unwrap();
        assert!(json.get("sessionFingerprint").is_some());
        assert!(json.get("timestampBucket").is_some());
        assert!(json.get("sequenceNumber").is_some());
        assert!(json.get("session_fingerprint").is_none());
    }

    #[test]
    fn test_batch_round_trip() {
        let batch = SecureEventBatch {
            events: vec![sample_event()],
            device_fingerprint: "dev-1".into(),
            batch_id: "b-1".into(),
            sent_at: "2026-08-01T10:06:00Z".into(),
        };
        let json = serde_json::to_string(&batch).unwrap();
        let back: SecureEventBatch = serde_json::from_str(&json).unwrap();
        assert_eq!(back.events.len(), 1);
        assert_eq!(back.device_fingerprint, "dev-1");
    }
}
