//! Storage seams for the resources whose mutations announce events.
//!
//! Handlers depend on the traits; `main` wires the in-memory implementations.

pub mod registration;
pub mod task;

pub use registration::{InMemoryRegistrationStore, RegistrationStore};
pub use task::{InMemoryTaskStore, TaskStore};
