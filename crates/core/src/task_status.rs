//! Task workflow status values and validation.
//!
//! These must match the values accepted by the task service's status
//! endpoint and rendered as board columns by the frontend.

use serde::{Deserialize, Serialize};

pub const STATUS_TODO: &str = "TODO";
pub const STATUS_IN_PROGRESS: &str = "IN_PROGRESS";
pub const STATUS_DONE: &str = "DONE";

/// All valid status values, in board order.
pub const VALID_TASK_STATUSES: &[&str] = &[STATUS_TODO, STATUS_IN_PROGRESS, STATUS_DONE];

/// Workflow column a task currently sits in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Todo,
    InProgress,
    Done,
}

impl TaskStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => STATUS_TODO,
            TaskStatus::InProgress => STATUS_IN_PROGRESS,
            TaskStatus::Done => STATUS_DONE,
        }
    }
}

impl std::fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parse a status string, rejecting anything outside [`VALID_TASK_STATUSES`].
pub fn validate_task_status(status: &str) -> Result<TaskStatus, String> {
    match status {
        STATUS_TODO => Ok(TaskStatus::Todo),
        STATUS_IN_PROGRESS => Ok(TaskStatus::InProgress),
        STATUS_DONE => Ok(TaskStatus::Done),
        other => Err(format!(
            "Invalid status '{other}'. Must be one of: {}",
            VALID_TASK_STATUSES.join(", ")
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_statuses_accepted() {
        assert_eq!(validate_task_status("TODO"), Ok(TaskStatus::Todo));
        assert_eq!(validate_task_status("IN_PROGRESS"), Ok(TaskStatus::InProgress));
        assert_eq!(validate_task_status("DONE"), Ok(TaskStatus::Done));
    }

    #[test]
    fn test_invalid_status_rejected() {
        let result = validate_task_status("BLOCKED");
        assert!(result.is_err());
        assert!(result.unwrap_err().contains("Invalid status"));
    }

    #[test]
    fn test_status_is_case_sensitive() {
        assert!(validate_task_status("done").is_err());
    }

    #[test]
    fn test_serde_uses_wire_names() {
        let json = serde_json::to_string(&TaskStatus::InProgress).unwrap();
        assert_eq!(json, "\"IN_PROGRESS\"");
        let parsed: TaskStatus = serde_json::from_str("\"DONE\"").unwrap();
        assert_eq!(parsed, TaskStatus::Done);
    }

    #[test]
    fn test_default_is_todo() {
        assert_eq!(TaskStatus::default().as_str(), STATUS_TODO);
    }
}
