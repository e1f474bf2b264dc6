//! Shared domain vocabulary for the teamboard services.
//!
//! Holds the identifier and timestamp aliases, well-known role names,
//! task status values and the domain-level [`error::CoreError`] used by
//! every other crate in the workspace.

pub mod error;
pub mod roles;
pub mod task_status;
pub mod types;
