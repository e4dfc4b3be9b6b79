//! The privacy pipeline: one raw event in, one secure event out.

use tracing::trace;

use ghostflow_protocols::{EventPayload, RawEvent, SecureEvent};

use crate::dp::DifferentialPrivacy;
use crate::hash::fnv1a_32_hex;
use crate::intent::IntentEncoder;
use crate::scrubber::PiiScrubber;

/// Orchestrates scrub, encode, and perturb for each raw event.
///
/// The pipeline owns a raw event for the duration of one `process` call and
/// nothing survives it except the returned [`SecureEvent`]. It never raises:
/// malformed inputs yield best-effort secure events with the affected field
/// omitted.
pub struct PrivacyPipeline {
    org_id: String,
    device_id: String,
    user_id: String,
    scrubber: PiiScrubber,
    encoder: IntentEncoder,
    dp: DifferentialPrivacy,
    sequence: u64,
}

impl PrivacyPipeline {
    pub fn new(
        org_id: impl Into<String>,
        device_id: impl Into<String>,
        user_id: impl Into<String>,
    ) -> Self {
        Self {
            org_id: org_id.into(),
            device_id: device_id.into(),
            user_id: user_id.into(),
            scrubber: PiiScrubber::new(),
            encoder: IntentEncoder::new(),
            dp: DifferentialPrivacy::new(),
            sequence: 0,
        }
    }

    /// Test constructor with deterministic noise.
    pub fn with_seeded_noise(
        org_id: impl Into<String>,
        device_id: impl Into<String>,
        user_id: impl Into<String>,
        seed: u64,
    ) -> Self {
        let mut pipeline = Self::new(org_id, device_id, user_id);
        pipeline.dp = DifferentialPrivacy::with_seed(DifferentialPrivacy::DEFAULT_EPSILON, seed);
        pipeline
    }

    /// Transform one raw event into its secure form, consuming it.
    pub fn process(&mut self, mut event: RawEvent) -> SecureEvent {
        self.scrub_in_place(&mut event);
        event.context.url = hash_url(&event.context.url);

        let encoding = self.encoder.encode(&event);

        let (structural_hash, element_signature) = match &event.payload {
            EventPayload::UserInteraction { target: Some(target), .. } => (
                DifferentialPrivacy::structural_hash(&target.dom_path, &target.tag_name),
                Some(DifferentialPrivacy::element_signature(
                    &target.tag_name,
                    target.aria.role.as_deref(),
                    &target.dom_path,
                )),
            ),
            _ => (DifferentialPrivacy::structural_hash(&[], ""), None),
        };

        self.sequence += 1;
        trace!(seq = self.sequence, label = %encoding.label, "event crossed privacy boundary");

        SecureEvent {
            session_fingerprint: DifferentialPrivacy::session_fingerprint(
                &self.device_id,
                &self.user_id,
                event.timestamp,
            ),
            timestamp_bucket: self.dp.anonymize_timestamp(event.timestamp),
            intent_vector: self.dp.perturb_vector(&encoding.vector),
            structural_hash,
            org_id: self.org_id.clone(),
            event_type: event.event_type,
            intent_label: encoding.label,
            intent_confidence: encoding.confidence,
            element_signature,
            sequence_number: self.sequence,
        }
    }

    /// Zero the sequence counter and forget all PII tokens. Called on
    /// session rotation.
    pub fn reset(&mut self) {
        self.sequence = 0;
        self.scrubber.reset();
    }

    /// Scrub every free-text field the payload can carry, and drop the
    /// pre-scrub text preview entirely.
    fn scrub_in_place(&mut self, event: &mut RawEvent) {
        match &mut event.payload {
            EventPayload::UserInteraction { value, message, target, .. } => {
                if let Some(value) = value {
                    *value = self.scrubber.scrub(value);
                }
                if let Some(message) = message {
                    *message = self.scrubber.scrub(message);
                }
                if let Some(target) = target {
                    target.text_preview = None;
                }
            }
            EventPayload::DomMutation { mutations } => {
                for mutation in mutations {
                    if let Some(old) = &mutation.old_value {
                        mutation.old_value = Some(self.scrubber.scrub(old));
                    }
                    if let Some(new) = &mutation.new_value {
                        mutation.new_value = Some(self.scrubber.scrub(new));
                    }
                }
            }
            EventPayload::Network { .. } => {}
            EventPayload::Error { message, stack } => {
                *message = self.scrubber.scrub(message);
                *stack = None;
            }
        }
    }
}

/// Replace a URL with `origin/` plus an 8-hex hash of its path and query.
/// Unparseable URLs hash in full.
fn hash_url(url: &str) -> String {
    match url.find("://").and_then(|scheme_end| {
        let after = scheme_end + 3;
        url[after..].find('/').map(|slash| after + slash)
    }) {
        Some(path_start) => {
            let origin = &url[..path_start];
            let rest = &url[path_start..];
            format!("{origin}/{}", fnv1a_32_hex(rest.as_bytes()))
        }
        None if url.contains("://") => url.to_string(),
        None => format!("/{}", fnv1a_32_hex(url.as_bytes())),
    }
}

#[cfg(test)]
#[path = "pipeline_tests.rs"]
mod tests;
