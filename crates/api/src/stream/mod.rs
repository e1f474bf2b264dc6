//! Server-push notification stream.
//!
//! Two long-lived HTTP endpoints, each registering connections with its own
//! [`EventHub`](teamboard_events::EventHub): a principal-keyed stream for task
//! notifications and a role-keyed stream for review-queue notices. The
//! heartbeat task keeps idle streams alive and prunes dead ones.

mod handler;
mod heartbeat;

pub use handler::{principal_stream, role_stream, StreamKeyMode, EVENT_STREAM_MIME};
pub use heartbeat::start_heartbeat;
