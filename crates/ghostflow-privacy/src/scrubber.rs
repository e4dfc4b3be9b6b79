//! PII detection and stable token replacement.

use regex::Regex;
use std::collections::HashMap;
use std::sync::LazyLock;
use tracing::trace;

/// Entity kinds the scrubber detects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PiiKind {
    Email,
    Phone,
    Ssn,
    CreditCard,
    IpAddress,
    AuthToken,
    Dob,
}

impl PiiKind {
    /// Token label, e.g. `EMAIL` in `[EMAIL_1]`.
    pub fn label(&self) -> &'static str {
        match self {
            PiiKind::Email => "EMAIL",
            PiiKind::Phone => "PHONE",
            PiiKind::Ssn => "SSN",
            PiiKind::CreditCard => "CREDIT_CARD",
            PiiKind::IpAddress => "IP_ADDRESS",
            PiiKind::AuthToken => "AUTH_TOKEN",
            PiiKind::Dob => "DOB",
        }
    }
}

/// One detected entity, byte offsets into the original text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetectedEntity {
    pub kind: PiiKind,
    pub start: usize,
    pub end: usize,
    pub value: String,
}

static DETECTORS: LazyLock<Vec<(PiiKind, Regex)>> = LazyLock::new(|| {
    // Order only matters for equal-length ties at the same offset.
    vec![
        (
            PiiKind::Email,
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
        ),
        (
            PiiKind::AuthToken,
            Regex::new(
                r#"(?i)(?:Bearer\s+[A-Za-z0-9._~+/=-]{8,}|(?:api[_-]?key|token|secret|password|auth)["']?\s*[:=]\s*["']?[^\s"',;]+)"#,
            )
            .unwrap(),
        ),
        (
            PiiKind::CreditCard,
            Regex::new(r"\b(?:\d{4}[- ]?){3}\d{4}\b").unwrap(),
        ),
        (PiiKind::Ssn, Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap()),
        (
            PiiKind::Phone,
            Regex::new(r"\+?\d{0,3}[-. ]?\(?\d{3}\)?[-. ]?\d{3}[-. ]?\d{4}").unwrap(),
        ),
        (
            PiiKind::IpAddress,
            Regex::new(r"\b(?:(?:25[0-5]|2[0-4]\d|1?\d?\d)\.){3}(?:25[0-5]|2[0-4]\d|1?\d?\d)\b")
                .unwrap(),
        ),
        (
            PiiKind::Dob,
            Regex::new(r"\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4})\b").unwrap(),
        ),
    ]
});

/// Detects and replaces PII with stable `[TYPE_N]` tokens.
///
/// `N` is a session-scoped counter assigned in first-seen order per distinct
/// normalized value, so the same email always scrubs to the same token
/// within one session. The table resets on session rotation.
#[derive(Debug, Default)]
pub struct PiiScrubber {
    counters: HashMap<PiiKind, u32>,
    assigned: HashMap<(PiiKind, String), u32>,
}

impl PiiScrubber {
    pub fn new() -> Self {
        Self::default()
    }

    /// Detect entities without mutating scrubber state. Overlapping matches
    /// are resolved: the longer match wins, ties go to the earlier one.
    pub fn detect(text: &str) -> Vec<DetectedEntity> {
        let mut candidates: Vec<DetectedEntity> = Vec::new();
        for (kind, regex) in DETECTORS.iter() {
            for found in regex.find_iter(text) {
                candidates.push(DetectedEntity {
                    kind: *kind,
                    start: found.start(),
                    end: found.end(),
                    value: found.as_str().to_string(),
                });
            }
        }

        // Longer first, then earlier, then detector order for stability.
        candidates.sort_by(|a, b| {
            (b.end - b.start)
                .cmp(&(a.end - a.start))
                .then(a.start.cmp(&b.start))
                .then(a.kind.cmp(&b.kind))
        });

        let mut accepted: Vec<DetectedEntity> = Vec::new();
        for candidate in candidates {
            let overlaps = accepted
                .iter()
                .any(|kept| candidate.start < kept.end && kept.start < candidate.end);
            if !overlaps {
                accepted.push(candidate);
            }
        }
        accepted.sort_by_key(|e| e.start);
        accepted
    }

    /// Whether the text contains any detectable PII.
    pub fn contains_pii(text: &str) -> bool {
        !Self::detect(text).is_empty()
    }

    /// Replace every detected entity with its stable token.
    pub fn scrub(&mut self, text: &str) -> String {
        let entities = Self::detect(text);
        if entities.is_empty() {
            return text.to_string();
        }
        trace!(count = entities.len(), "scrubbing detected entities");

        let mut out = String::with_capacity(text.len());
        let mut cursor = 0;
        for entity in entities {
            out.push_str(&text[cursor..entity.start]);
            let n = self.token_number(entity.kind, &entity.value);
            out.push_str(&format!("[{}_{}]", entity.kind.label(), n));
            cursor = entity.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    /// Forget all assigned tokens. Called on session rotation.
    pub fn reset(&mut self) {
        self.counters.clear();
        self.assigned.clear();
    }

    fn token_number(&mut self, kind: PiiKind, value: &str) -> u32 {
        let normalized: String = value
            .to_lowercase()
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '.'))
            .collect();
        if let Some(n) = self.assigned.get(&(kind, normalized.clone())) {
            return *n;
        }
        let counter = self.counters.entry(kind).or_insert(0);
        *counter += 1;
        self.assigned.insert((kind, normalized), *counter);
        *counter
    }
}

#[cfg(test)]
#[path = "scrubber_tests.rs"]
mod tests;
