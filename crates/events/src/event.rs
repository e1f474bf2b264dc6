use serde::{Deserialize, Serialize};

use crate::event_types::CONNECTED;

/// A change notification announced by a business operation.
///
/// Events are never persisted. Receivers treat them as invalidation signals
/// and refetch authoritative state rather than trusting the payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Name from [`event_types`](crate::event_types), e.g. `"task_updated"`.
    #[serde(rename = "type")]
    pub event_type: String,

    /// Free-form JSON payload carrying event-specific identifiers.
    pub payload: serde_json::Value,
}

impl Event {
    pub fn new(event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            event_type: event_type.into(),
            payload,
        }
    }

    /// The `connected` acknowledgement written when a stream opens.
    pub fn connected() -> Self {
        Self::new(CONNECTED, serde_json::json!({ "ok": true }))
    }
}
