//! Units written to a subscriber connection and their text encoding.
//!
//! ```text
//! event: <type>\n
//! data: <json>\n
//! \n
//! ```
//!
//! Keep-alives are a single comment line, `:keepalive\n\n`.

use std::sync::Arc;

use crate::event::Event;

/// Comment text of the keep-alive frame.
pub const KEEPALIVE_COMMENT: &str = "keepalive";

/// One unit of output for a subscriber connection.
///
/// Events are shared behind an `Arc` so a broadcast clones a pointer per
/// connection rather than the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Event(Arc<Event>),
    KeepAlive,
}

impl Frame {
    /// Encode the frame in the event-stream text format.
    pub fn encode(&self) -> String {
        match self {
            Frame::Event(event) => {
                format!("event: {}\ndata: {}\n\n", event.event_type, event.payload)
            }
            Frame::KeepAlive => format!(":{KEEPALIVE_COMMENT}\n\n"),
        }
    }

    pub fn as_event(&self) -> Option<&Event> {
        match self {
            Frame::Event(event) => Some(event),
            Frame::KeepAlive => None,
        }
    }
}

impl From<Event> for Frame {
    fn from(event: Event) -> Self {
        Frame::Event(Arc::new(event))
    }
}
