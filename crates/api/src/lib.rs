//! Teamboard API server library.
//!
//! Exposes the building blocks (config, state, error handling, routes, the
//! notification stream, the authorization gate) so integration tests and the
//! binary entrypoint can both access them.

pub mod auth;
pub mod config;
pub mod error;
pub mod gate;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
pub mod store;
pub mod stream;
