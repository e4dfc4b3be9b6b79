//! Deterministic intent classification and vector encoding.

use ghostflow_protocols::{
    ElementFingerprint, EventPayload, IntentClass, MutationRecord, RawEvent, INTENT_DIMENSIONS,
};

use crate::hash::fnv1a_32;

/// Weight of event features when mixed into the class base vector.
const FEATURE_WEIGHT: f32 = 0.3;

/// Classification plus the deterministic vector.
#[derive(Debug, Clone)]
pub struct IntentEncoding {
    pub label: IntentClass,
    pub confidence: f32,
    pub vector: Vec<f32>,
}

/// Rule-based intent encoder.
///
/// Classification is a closed decision table over the event payload, and the
/// vector is generated from a per-class seeded generator mixed with event
/// features: two events of the same class with identical features yield
/// byte-identical vectors. This is the deterministic stand-in for a learned
/// embedding model; swap the implementation behind [`IntentEncoder::encode`]
/// to upgrade.
#[derive(Debug, Default, Clone, Copy)]
pub struct IntentEncoder;

impl IntentEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Classify an event into `(label, confidence)`.
    pub fn classify(&self, event: &RawEvent) -> (IntentClass, f32) {
        match &event.payload {
            EventPayload::UserInteraction { action, target, .. } => {
                classify_interaction(action, target.as_ref())
            }
            EventPayload::DomMutation { mutations } => classify_mutation(mutations),
            EventPayload::Network { method, url, status } => {
                classify_network(method, url, *status)
            }
            EventPayload::Error { .. } => (IntentClass::ErrorHandling, 0.90),
        }
    }

    /// Classify and produce the 128-dimensional vector.
    pub fn encode(&self, event: &RawEvent) -> IntentEncoding {
        let (label, confidence) = self.classify(event);
        IntentEncoding {
            label,
            confidence,
            vector: generate_vector(label, event),
        }
    }
}

fn classify_interaction(
    action: &str,
    target: Option<&ElementFingerprint>,
) -> (IntentClass, f32) {
    let input_type = target.and_then(|t| t.input_type.as_deref());
    let tag = target.map(|t| t.tag_name.as_str()).unwrap_or("");
    let role = target.and_then(|t| t.aria.role.as_deref());
    let in_form = target
        .map(|t| t.form_id.is_some() || t.dom_path.iter().any(|seg| seg.starts_with("form")))
        .unwrap_or(false);

    match action {
        "input" if matches!(input_type, Some("password") | Some("email")) => {
            (IntentClass::Authentication, 0.85)
        }
        "input" | "paste" => (IntentClass::DataEntry, 0.90),
        "navigate" => (IntentClass::Navigation, 0.95),
        "click" if tag == "a" => (IntentClass::Navigation, 0.85),
        "click" if tag == "button" || role == Some("button") => {
            if in_form {
                (IntentClass::DataEntry, 0.80)
            } else {
                (IntentClass::WorkflowTransition, 0.70)
            }
        }
        "click" if matches!(input_type, Some("checkbox") | Some("radio")) => {
            (IntentClass::Configuration, 0.75)
        }
        "select" => (IntentClass::DataEntry, 0.85),
        "copy" => (IntentClass::DataExtraction, 0.80),
        "scroll" => (IntentClass::Research, 0.50),
        "focus" => (IntentClass::Navigation, 0.40),
        _ => (IntentClass::Unknown, 0.15),
    }
}

fn classify_mutation(mutations: &[MutationRecord]) -> (IntentClass, f32) {
    let churn: u32 = mutations.iter().map(|m| m.added_nodes + m.removed_nodes).sum();
    if churn > 20 {
        return (IntentClass::Navigation, 0.60);
    }
    let form_like = mutations.iter().any(|m| {
        m.form_id.is_some()
            || matches!(m.target_tag.as_deref(), Some("input") | Some("textarea") | Some("select"))
    });
    if form_like {
        (IntentClass::DataEntry, 0.50)
    } else {
        (IntentClass::Unknown, 0.15)
    }
}

fn classify_network(method: &str, url: &str, status: Option<u16>) -> (IntentClass, f32) {
    let url = url.to_lowercase();
    let contains_any = |needles: &[&str]| needles.iter().any(|n| url.contains(n));

    if status.is_some_and(|s| s >= 400) {
        return (IntentClass::ErrorHandling, 0.60);
    }
    match method.to_uppercase().as_str() {
        "POST" | "PUT" | "PATCH" => {
            if contains_any(&["auth", "login", "token"]) {
                (IntentClass::Authentication, 0.85)
            } else if contains_any(&["message", "email", "send"]) {
                (IntentClass::Communication, 0.75)
            } else {
                (IntentClass::DataEntry, 0.70)
            }
        }
        "DELETE" => (IntentClass::WorkflowTransition, 0.70),
        "GET" => {
            if contains_any(&["search", "query"]) {
                (IntentClass::Research, 0.70)
            } else if contains_any(&["export", "download"]) {
                (IntentClass::DataExtraction, 0.75)
            } else {
                (IntentClass::Unknown, 0.15)
            }
        }
        _ => (IntentClass::Unknown, 0.15),
    }
}

/// Linear congruential generator with fixed parameters; the per-class seed
/// pins the base vector across deployments.
struct Lcg(u32);

impl Lcg {
    fn next_unit(&mut self) -> f32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (f64::from(self.0) / f64::from(u32::MAX) - 0.5) as f32
    }
}

fn generate_vector(label: IntentClass, event: &RawEvent) -> Vec<f32> {
    let mut lcg = Lcg(label.seed());
    let features = event_features(event);

    let mut vector: Vec<f32> = (0..INTENT_DIMENSIONS)
        .map(|i| {
            let base = lcg.next_unit();
            base * (1.0 - FEATURE_WEIGHT) + features[i % features.len()] * FEATURE_WEIGHT
        })
        .collect();

    let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in &mut vector {
            *v /= norm;
        }
    }
    for v in &mut vector {
        *v = (*v * 10_000.0).round() / 10_000.0;
    }
    vector
}

/// Seven scalar features in `[0, 1]`, cycled across the dimensions.
fn event_features(event: &RawEvent) -> [f32; 7] {
    const ACTIONS: [&str; 8] = [
        "click", "input", "paste", "navigate", "select", "copy", "scroll", "focus",
    ];
    const METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

    let mut features = [0.0f32; 7];
    match &event.payload {
        EventPayload::UserInteraction { action, target, .. } => {
            features[0] = ACTIONS
                .iter()
                .position(|a| a == action)
                .map(|i| i as f32 / ACTIONS.len() as f32)
                .unwrap_or(0.0);
            if let Some(target) = target {
                features[1] = (fnv1a_32(target.tag_name.as_bytes()) % 1_000) as f32 / 1_000.0;
                features[2] = (target.dom_path.len() as f32 / 20.0).min(1.0);
                features[3] = target.position.rel_x as f32;
                features[4] = target.position.rel_y as f32;
            }
        }
        EventPayload::Network { method, status, .. } => {
            features[5] = METHODS
                .iter()
                .position(|m| m.eq_ignore_ascii_case(method))
                .map(|i| i as f32 / METHODS.len() as f32)
                .unwrap_or(0.0);
            features[6] = status.map(|s| f32::from(s.min(599)) / 599.0).unwrap_or(0.0);
        }
        EventPayload::DomMutation { mutations } => {
            features[2] = (mutations.len() as f32 / 50.0).min(1.0);
        }
        EventPayload::Error { .. } => {}
    }
    features
}

#[cfg(test)]
#[path = "intent_tests.rs"]
mod tests;
