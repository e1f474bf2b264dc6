//! Resilient consumer for the teamboard notification stream.
//!
//! Opens the long-lived `text/event-stream` channel served by the API,
//! parses frames incrementally as bytes arrive, hands events to a
//! [`client::StreamHandler`], and reconnects with capped exponential
//! backoff until the [`client::Subscription`] is stopped.

pub mod backoff;
pub mod client;
pub mod parser;

pub use backoff::{Backoff, BackoffConfig};
pub use client::{
    ConnectionState, HandlerError, StreamClient, StreamClientConfig, StreamError, StreamHandler,
    Subscription,
};
pub use parser::{EventData, FrameParser, ParsedFrame, StreamEvent};
