//! Self-healing: replace a failed step with an LLM-proposed substitute.

use serde::Deserialize;
use tracing::warn;

use ghostflow_protocols::{
    ActionSpec, ChatMessage, CompletionRequest, ExecutionNode, LlmProvider, NodeType, ToolKind,
};

/// Hard timeout for repair calls, seconds.
pub const HEAL_TIMEOUT_SECONDS: u64 = 30;

const SYSTEM_PROMPT: &str = "A workflow step failed. Propose exactly one substitute step that \
achieves the same goal another way, preferring a different tool or strategy. Respond with a \
single JSON object {\"tool\", \"params\"}. Allowed tools: navigate_to, click_element, \
input_text, api_call, extract_data, human_escalation. When nothing automated can work, \
escalate to a human with a clear reason.";

#[derive(Debug, Deserialize)]
struct Proposal {
    tool: ToolKind,
    #[serde(default)]
    params: serde_json::Value,
}

/// Ask the model for a substitute node for a failed step. `None` means the
/// repair itself failed and the execution must finalize as failed.
pub async fn propose_substitute(
    provider: &dyn LlmProvider,
    failed_node: &ExecutionNode,
    error: &str,
) -> Option<ExecutionNode> {
    let node_json = serde_json::to_string(failed_node).unwrap_or_else(|_| "{}".into());
    let request = CompletionRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(format!("Failed step:\n{node_json}\n\nError:\n{error}")),
    ])
    .with_temperature(0.1)
    .with_max_tokens(512)
    .with_timeout_seconds(HEAL_TIMEOUT_SECONDS);

    let response = match provider.complete(request).await {
        Ok(response) => response,
        Err(error) => {
            warn!(node = %failed_node.id, %error, "repair call failed");
            return None;
        }
    };

    let text = response.text();
    let value = extract_object(text)?;
    let proposal: Proposal = match serde_json::from_value(value) {
        Ok(proposal) => proposal,
        Err(error) => {
            warn!(node = %failed_node.id, %error, "repair proposal did not parse");
            return None;
        }
    };

    Some(ExecutionNode {
        id: format!("heal-{}", failed_node.id),
        node_type: NodeType::Action,
        action: Some(ActionSpec {
            tool: proposal.tool,
            params: proposal.params,
        }),
        condition: None,
        children: None,
        fallback: None,
        timeout: failed_node.timeout,
    })
}

/// First top-level JSON object in free text.
fn extract_object(text: &str) -> Option<serde_json::Value> {
    let start = text.find('{')?;
    let candidate = &text[start..];
    let bytes = candidate.as_bytes();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (i, &byte) in bytes.iter().enumerate() {
        match byte {
            _ if escaped => escaped = false,
            b'\\' if in_string => escaped = true,
            b'"' => in_string = !in_string,
            b'{' if !in_string => depth += 1,
            b'}' if !in_string => {
                depth -= 1;
                if depth == 0 {
                    return serde_json::from_str(&candidate[..=i]).ok();
                }
            }
            _ => {}
        }
    }
    None
}
