//! LLM planning with escalation fallback.

use tracing::{debug, warn};

use ghostflow_protocols::{
    validate_plan, ChatMessage, CompletionRequest, ExecutionNode, Ghost, LlmProvider,
};

/// Hard timeout for planning calls, seconds.
pub const PLAN_TIMEOUT_SECONDS: u64 = 30;

/// Escalation reason used when no plan can be produced.
pub const PLAN_FALLBACK_REASON: &str = "Could not generate execution plan automatically";

const SYSTEM_PROMPT: &str = "You are a workflow planner. Produce an execution plan as a JSON \
array of nodes: [{\"id\", \"type\": \"action\", \"action\": {\"tool\", \"params\"}}]. \
Allowed tools: navigate_to, click_element, input_text, api_call, extract_data, \
human_escalation. Prefer api_call over browser tools whenever an API exists. \
Give risky or ambiguous steps a fallback node. Respond with the array only.";

/// Resolve the plan for a ghost.
///
/// A stored plan is used as-is. Otherwise the LLM is asked; any failure -
/// provider error, missing array, invalid node shapes - degrades to the
/// single-step human escalation plan rather than an error.
pub async fn resolve_plan(ghost: &Ghost, provider: &dyn LlmProvider) -> Vec<ExecutionNode> {
    if !ghost.execution_plan.is_empty() {
        return ghost.execution_plan.clone();
    }

    match generate_plan(ghost, provider).await {
        Some(plan) => plan,
        None => {
            warn!(ghost = %ghost.id, "falling back to human escalation plan");
            vec![ExecutionNode::escalation(PLAN_FALLBACK_REASON)]
        }
    }
}

async fn generate_plan(ghost: &Ghost, provider: &dyn LlmProvider) -> Option<Vec<ExecutionNode>> {
    let user_prompt = format!(
        "Workflow: {}\nDescription: {}\nParameters: {}\nProduce the execution plan.",
        ghost.name,
        ghost.description.as_deref().unwrap_or("(none)"),
        serde_json::to_string(&ghost.parameters).unwrap_or_else(|_| "[]".into()),
    );

    let request = CompletionRequest::new(vec![
        ChatMessage::system(SYSTEM_PROMPT),
        ChatMessage::user(user_prompt),
    ])
    .with_temperature(0.1)
    .with_max_tokens(2_048)
    .with_timeout_seconds(PLAN_TIMEOUT_SECONDS);

    let response = match provider.complete(request).await {
        Ok(response) => response,
        Err(error) => {
            warn!(ghost = %ghost.id, %error, "planner call failed");
            return None;
        }
    };

    let value = extract_first_json_array(response.text())?;
    let plan: Vec<ExecutionNode> = match serde_json::from_value(value) {
        Ok(plan) => plan,
        Err(error) => {
            warn!(ghost = %ghost.id, %error, "planner output did not parse as nodes");
            return None;
        }
    };
    if plan.is_empty() || validate_plan(&plan).is_err() {
        return None;
    }
    debug!(ghost = %ghost.id, nodes = plan.len(), "plan generated");
    Some(plan)
}

/// Find and parse the first complete top-level JSON array in free text.
pub fn extract_first_json_array(text: &str) -> Option<serde_json::Value> {
    let bytes = text.as_bytes();
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find('[') {
        let start = search_from + offset;
        let mut depth = 0usize;
        let mut in_string = false;
        let mut escaped = false;
        for (i, &byte) in bytes.iter().enumerate().skip(start) {
            match byte {
                _ if escaped => escaped = false,
                b'\\' if in_string => escaped = true,
                b'"' => in_string = !in_string,
                b'[' if !in_string => depth += 1,
                b']' if !in_string => {
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
