//! Abstraction lifting: clusters become named workflow candidates.

use serde::Deserialize;
use std::collections::BTreeMap;
use tracing::debug;

use ghostflow_protocols::{ChatMessage, CompletionRequest, LlmProvider, ProviderError};

use crate::density::Cluster;

/// Sequences sampled per cluster when rendering the prompt.
pub const MAX_SAMPLES: usize = 5;
/// Hard timeout for lifting calls, seconds.
pub const LIFT_TIMEOUT_SECONDS: u64 = 30;

const SYSTEM_PROMPT: &str = "You analyze recurring user workflow instances and name the \
underlying business workflow. Respond with a single JSON object: \
{\"name\", \"description\", \"confidence\", \"trigger\", \"parameters\"}. \
The name must be specific to the domain visible in the instances - never a \
generic placeholder like \"Navigation\" or \"Data Entry\". Confidence is \
your belief in [0,1] that the instances are one deliberate workflow.";

/// The model's description of a cluster.
#[derive(Debug, Clone, Deserialize)]
pub struct LiftedPattern {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    #[serde(default)]
    pub trigger: Option<serde_json::Value>,
    #[serde(default)]
    pub parameters: Option<serde_json::Value>,
}

/// Ask the model to name one cluster.
///
/// Failures (provider errors, unparseable output) are reported to the
/// caller, which isolates them per cluster.
pub async fn lift(
    provider: &dyn LlmProvider,
    cluster: &Cluster,
) -> Result<LiftedPattern, ProviderError> {
    let request = CompletionRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(render_cluster(cluster)),
    ])
    .with_temperature(0.2)
    .with_max_tokens(512)
    .with_timeout_seconds(LIFT_TIMEOUT_SECONDS);

    let response = provider.complete(request).await?;
    let text = response.text();
    let value = extract_first_json_object(text).ok_or_else(|| {
        ProviderError::MalformedResponse(format!("no JSON object in lift response: {text:.120}"))
    })?;
    let lifted: LiftedPattern = serde_json::from_value(value)
        .map_err(|e| ProviderError::MalformedResponse(e.to_string()))?;
    debug!(name = %lifted.name, "cluster lifted");
    Ok(lifted)
}

/// Render sampled member sequences plus a label frequency summary.
pub fn render_cluster(cluster: &Cluster) -> String {
    let mut out = String::from("Workflow instances observed:\n");
    for (n, member) in cluster.members.iter().take(MAX_SAMPLES).enumerate() {
        let rendered: Vec<String> = member
            .events
            .iter()
            .map(|e| {
                format!(
                    "{} ({})",
                    e.intent_label.as_str(),
                    serde_json::to_value(e.event_type)
                        .ok()
                        .and_then(|v| v.as_str().map(str::to_string))
                        .unwrap_or_default()
                )
            })
            .collect();
        out.push_str(&format!("{}. {}\n", n + 1, rendered.join(" -> ")));
    }

    let mut frequency: BTreeMap<&str, usize> = BTreeMap::new();
    for member in &cluster.members {
        for event in &member.events {
            *frequency.entry(event.intent_label.as_str()).or_default() += 1;
        }
    }
    out.push_str("\nIntent frequency: ");
    let summary: Vec<String> = frequency.iter().map(|(label, n)| format!("{label}={n}")).collect();
    out.push_str(&summary.join(", "));
    out
}

/// Find and parse the first complete top-level JSON object in free text,
/// tolerating surrounding prose.
pub fn extract_first_json_object(text: &str) -> Option<serde_json::Value> {
    let bytes = text.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('{') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (i, &byte) in bytes.iter().enumerate().skip(start) {
            match byte {
                _ if escaped => escaped = false,
                b'\\' if in_string => escaped = true,
                b'"' => in_string = !in_string,
                b'{' if !in_string => depth += 1,
                b'}' if !in_string => {
                    depth -= 1;
                    if depth == 0 {
                        if let Ok(value) = serde_json::from_str(&text[start..=i]) {
                            return Some(value);
                        }
                        break;
                    }
                }
                _ => {}
            }
        }
        search_from = start + 1;
    }
    None
}
