//! Teamboard realtime event distribution.
//!
//! This crate provides the in-process building blocks every service uses to
//! push change notifications to connected sessions:
//!
//! - [`Event`] -- the ephemeral `{type, payload}` envelope.
//! - [`event_types`] -- the catalogue of event names consumers switch on.
//! - [`SubscriberKey`] -- the typed identity a connection is registered under.
//! - [`Frame`] -- what travels down a connection, with its wire encoding.
//! - [`EventHub`] -- the subscriber registry and fan-out primitive.

pub mod event;
pub mod event_types;
pub mod frame;
pub mod hub;
pub mod key;

pub use event::Event;
pub use frame::Frame;
pub use hub::{Connection, ConnectionId, Delivery, EventHub, FrameReceiver};
pub use key::SubscriberKey;
