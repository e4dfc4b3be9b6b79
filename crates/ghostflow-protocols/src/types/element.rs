//! Element fingerprint types and the capture-surface input shape.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// An element as serialized by the capture surface.
///
/// The browser-side observer walks the DOM and ships this shape; the core
/// never touches a live DOM. A detached element arrives with empty
/// `ancestors` and no parent or sibling information.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservedElement {
    /// Lowercase tag name, e.g. `"input"`.
    pub tag_name: String,

    /// Raw attribute map (`role`, `aria-*`, `type`, `placeholder`, ...).
    #[serde(default)]
    pub attributes: HashMap<String, String>,

    /// Concatenated direct text nodes (not descendants).
    #[serde(default)]
    pub direct_text: String,

    /// Bounding rect in CSS pixels, if the element is laid out.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bounds: Option<Bounds>,

    /// Ancestor chain from the document root down to (excluding) this
    /// element. `<html>` is not included.
    #[serde(default)]
    pub ancestors: Vec<PathSegment>,

    /// Parent element summary, absent for detached elements.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<ParentInfo>,

    /// Position among element siblings (text nodes excluded).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub siblings: Option<SiblingInfo>,

    /// Enclosing form id, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
}

impl ObservedElement {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            ..Default::default()
        }
    }

    /// Attribute lookup.
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes.get(name).map(String::as_str)
    }

    /// The ARIA role, if declared.
    pub fn role(&self) -> Option<&str> {
        self.attr("role")
    }
}

/// One segment of a DOM path.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathSegment {
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
}

impl PathSegment {
    pub fn new(tag_name: impl Into<String>) -> Self {
        Self {
            tag_name: tag_name.into(),
            role: None,
        }
    }

    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Render as `tag[role=...]` or bare `tag`.
    pub fn render(&self) -> String {
        match &self.role {
            Some(role) => format!("{}[role={}]", self.tag_name, role),
            None => self.tag_name.clone(),
        }
    }
}

/// Parent element summary.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParentInfo {
    pub tag_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default)]
    pub direct_text: String,
}

/// Sibling position among element siblings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiblingInfo {
    pub count: u32,
    pub index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_tag: Option<String>,
}

/// Bounding rect in CSS pixels.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// ARIA attributes carried into a fingerprint.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AriaAttributes {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub described_by: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expanded: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub checked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub selected: Option<bool>,
}

/// Position of an element relative to the viewport.
///
/// `rel_x`/`rel_y` are clamped to `[0, 1]`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
    pub vw: i32,
    pub vh: i32,
    pub rel_x: f64,
    pub rel_y: f64,
}

/// Sibling and parent context of a fingerprinted element.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ElementContext {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_role: Option<String>,
    /// Parent direct text, truncated to 100 characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_text: Option<String>,
    pub sibling_count: u32,
    pub sibling_index: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prev_sibling_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_sibling_tag: Option<String>,
}

/// Stable multi-factor semantic identifier for an observed element.
///
/// Invariants: `dom_path` is non-empty and rooted at the document root;
/// `position.rel_x`/`rel_y` lie in `[0, 1]`; `text_hash` is a stable
/// function of the lowercased trimmed direct text.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ElementFingerprint {
    pub aria: AriaAttributes,

    /// 128-bit simhash of the direct text, lowercase hex.
    pub text_hash: String,

    /// Raw text preview, at most 200 characters. Only populated before the
    /// scrub stage; must never appear in a secure event.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_preview: Option<String>,

    pub position: Position,

    /// Ordered root-first path of `tag[role=...]` segments, `<html>` excluded.
    pub dom_path: Vec<String>,

    pub tag_name: String,

    pub context: ElementContext,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_type: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment_render() {
        assert_eq!(PathSegment::new("div").render(), "div");
        assert_eq!(
            PathSegment::new("nav").with_role("navigation").render(),
            "nav[role=navigation]"
        );
    }

    #[test]
    fn test_observed_element_attr_lookup() {
        let mut el = ObservedElement::new("input");
        el.attributes.insert("type".into(), "password".into());
        el.attributes.insert("role".into(), "textbox".into());
        assert_eq!(el.attr("type"), Some("password"));
        assert_eq!(el.role(), Some("textbox"));
        assert_eq!(el.attr("missing"), None);
    }
}
