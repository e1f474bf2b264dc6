//! Event type names published by the services.
//!
//! Consumers switch on these strings; they are part of the wire contract and
//! must not be renamed.

/// Acknowledgement written as the first frame of every stream.
pub const CONNECTED: &str = "connected";

pub const TASK_CREATED: &str = "task_created";
pub const TASK_UPDATED: &str = "task_updated";
pub const TASK_DELETED: &str = "task_deleted";
pub const TASK_STATUS_CHANGED: &str = "task_status_changed";
/// Sent only to the principal that was assigned.
pub const TASK_ASSIGNED: &str = "task_assigned";

pub const PROJECT_CREATED: &str = "project_created";
pub const PROJECT_UPDATED: &str = "project_updated";
pub const PROJECT_DELETED: &str = "project_deleted";

pub const TEAM_CREATED: &str = "team_created";
pub const TEAM_UPDATED: &str = "team_updated";
pub const TEAM_DELETED: &str = "team_deleted";

pub const PROJECT_TEAM_CREATED: &str = "project_team_created";
pub const PROJECT_TEAM_UPDATED: &str = "project_team_updated";
pub const PROJECT_TEAM_DELETED: &str = "project_team_deleted";

/// Sent to the `ADMIN` role when a signup awaits activation.
pub const PENDING_CREATED: &str = "pending_created";
/// Sent to the `ADMIN` role when a pending signup is activated or rejected.
pub const PENDING_RESOLVED: &str = "pending_resolved";
