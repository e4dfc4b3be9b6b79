//! Element fingerprinting.

use ghostflow_protocols::{
    AriaAttributes, ElementContext, ElementFingerprint, ObservedElement, Position, Viewport,
};

use crate::hash::simhash128;

const TEXT_PREVIEW_MAX: usize = 200;
const PARENT_TEXT_MAX: usize = 100;

/// Produces a stable multi-factor identity for an observed element.
///
/// Deterministic given `(element, viewport)` and total: a detached element
/// (no ancestors, no parent) still yields a fingerprint, with an empty
/// parent context and a path containing only the element itself.
#[derive(Debug, Default, Clone, Copy)]
pub struct ElementFingerprinter;

impl ElementFingerprinter {
    pub fn new() -> Self {
        Self
    }

    pub fn fingerprint(&self, element: &ObservedElement, viewport: Viewport) -> ElementFingerprint {
        let aria = read_aria(element);
        let hashed_text = hashable_text(element);

        ElementFingerprint {
            aria,
            text_hash: simhash128(&hashed_text),
            text_preview: preview(&element.direct_text),
            position: position(element, viewport),
            dom_path: dom_path(element),
            tag_name: element.tag_name.clone(),
            context: context(element),
            input_type: input_type(element),
            form_id: element.form_id.clone(),
        }
    }
}

fn read_aria(element: &ObservedElement) -> AriaAttributes {
    AriaAttributes {
        role: element.attr("role").map(str::to_string),
        label: element.attr("aria-label").map(str::to_string),
        described_by: element.attr("aria-describedby").map(str::to_string),
        expanded: bool_attr(element, "aria-expanded"),
        checked: bool_attr(element, "aria-checked"),
        selected: bool_attr(element, "aria-selected"),
    }
}

fn bool_attr(element: &ObservedElement, name: &str) -> Option<bool> {
    match element.attr(name) {
        Some("true") => Some(true),
        Some("false") => Some(false),
        _ => None,
    }
}

/// Direct text only; inputs and textareas contribute their placeholder.
fn hashable_text(element: &ObservedElement) -> String {
    let mut text = element.direct_text.clone();
    if matches!(element.tag_name.as_str(), "input" | "textarea") {
        if let Some(placeholder) = element.attr("placeholder") {
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(placeholder);
        }
    }
    text
}

fn preview(text: &str) -> Option<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Some(trimmed.chars().take(TEXT_PREVIEW_MAX).collect())
}

fn position(element: &ObservedElement, viewport: Viewport) -> Position {
    let bounds = element.bounds.unwrap_or_default();
    let vw = viewport.width.max(1) as f64;
    let vh = viewport.height.max(1) as f64;
    Position {
        x: bounds.x.round() as i32,
        y: bounds.y.round() as i32,
        w: bounds.width.round() as i32,
        h: bounds.height.round() as i32,
        vw: viewport.width as i32,
        vh: viewport.height as i32,
        rel_x: (bounds.x / vw).clamp(0.0, 1.0),
        rel_y: (bounds.y / vh).clamp(0.0, 1.0),
    }
}

/// Root-first path of `tag[role=...]` segments ending at the element itself.
/// `<html>` never appears.
fn dom_path(element: &ObservedElement) -> Vec<String> {
    let mut path: Vec<String> = element
        .ancestors
        .iter()
        .filter(|seg| seg.tag_name != "html")
        .map(|seg| seg.render())
        .collect();

    let own = match element.role() {
        Some(role) => format!("{}[role={}]", element.tag_name, role),
        None => element.tag_name.clone(),
    };
    path.push(own);
    path
}

fn context(element: &ObservedElement) -> ElementContext {
    let (parent_tag, parent_role, parent_text) = match &element.parent {
        Some(parent) => {
            let text = parent.direct_text.trim();
            (
                Some(parent.tag_name.clone()),
                parent.role.clone(),
                (!text.is_empty()).then(|| text.chars().take(PARENT_TEXT_MAX).collect()),
            )
        }
        None => (None, None, None),
    };

    let (sibling_count, sibling_index, prev_sibling_tag, next_sibling_tag) = match &element.siblings
    {
        Some(info) => (info.count, info.index, info.prev_tag.clone(), info.next_tag.clone()),
        None => (0, 0, None, None),
    };

    ElementContext {
        parent_tag,
        parent_role,
        parent_text,
        sibling_count,
        sibling_index,
        prev_sibling_tag,
        next_sibling_tag,
    }
}

fn input_type(element: &ObservedElement) -> Option<String> {
    match element.tag_name.as_str() {
        "input" => Some(element.attr("type").unwrap_or("text").to_string()),
        "select" => Some("select".to_string()),
        "textarea" => Some("textarea".to_string()),
        _ => None,
    }
}

#[cfg(test)]
#[path = "fingerprint_tests.rs"]
mod tests;
