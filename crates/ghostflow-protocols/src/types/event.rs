//! Device-side raw observation events.
//!
//! A [`RawEvent`] exists only on the observing device. It is handed to the
//! privacy pipeline exactly once and destroyed afterwards; nothing in this
//! module is ever transmitted or persisted.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::element::ElementFingerprint;

/// Observation category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    #[serde(rename = "dom_mut")]
    DomMutation,
    #[serde(rename = "user_int")]
    UserInteraction,
    #[serde(rename = "network")]
    Network,
    #[serde(rename = "error")]
    Error,
}

/// Viewport dimensions at observation time.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

/// Page context of a raw event. Contains the plaintext URL; the pipeline
/// replaces it with an origin-plus-hash form before anything leaves the
/// device.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventContext {
    pub url: String,
    pub viewport: Viewport,
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<String>,
}

/// A single DOM mutation observation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MutationRecord {
    pub added_nodes: u32,
    pub removed_nodes: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target_tag: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub form_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub old_value: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_value: Option<String>,
}

/// Per-type event payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventPayload {
    /// A user interaction: click, input, paste, navigate, select, copy,
    /// scroll, focus. `action` is open-ended; the encoder maps unrecognized
    /// actions to the unknown intent.
    UserInteraction {
        action: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        value: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        target: Option<ElementFingerprint>,
    },

    /// A batch of DOM mutations delivered by the observer.
    DomMutation { mutations: Vec<MutationRecord> },

    /// An intercepted network request.
    Network {
        method: String,
        url: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        status: Option<u16>,
    },

    /// A page error.
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        stack: Option<String>,
    },
}

impl EventPayload {
    /// The event type this payload belongs to.
    pub fn event_type(&self) -> EventType {
        match self {
            EventPayload::UserInteraction { .. } => EventType::UserInteraction,
            EventPayload::DomMutation { .. } => EventType::DomMutation,
            EventPayload::Network { .. } => EventType::Network,
            EventPayload::Error { .. } => EventType::Error,
        }
    }
}

/// A raw observation. Device-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawEvent {
    /// Monotonic capture timestamp in milliseconds since the Unix epoch.
    pub timestamp: i64,

    /// Capture session id, rotated every 15 minutes by the surface.
    pub session_id: Uuid,

    pub event_type: EventType,

    pub payload: EventPayload,

    pub context: EventContext,
}

impl RawEvent {
    pub fn new(timestamp: i64, session_id: Uuid, payload: EventPayload, context: EventContext) -> Self {
        Self {
            timestamp,
            session_id,
            event_type: payload.event_type(),
            payload,
            context,
        }
    }
}
