//! Task records and their store.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use teamboard_core::error::CoreError;
use teamboard_core::task_status::TaskStatus;
use teamboard_core::types::{EntityId, Timestamp};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignee {
    pub user_id: EntityId,
    pub assigned_at: Timestamp,
}

/// A task scoped to a project. `team_id` holds the project id, which is
/// what the authorization gate matches team assignments against.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: EntityId,
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub team_id: EntityId,
    pub created_by: EntityId,
    pub due_date: Option<Timestamp>,
    pub assignees: Vec<Assignee>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Task {
    pub fn is_assigned(&self, user_id: &str) -> bool {
        self.assignees.iter().any(|a| a.user_id == user_id)
    }
}

/// Input for creating a task. Required-field checks happen in the handler.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub team_id: Option<EntityId>,
    pub due_date: Option<Timestamp>,
    #[serde(default)]
    pub assignees: Vec<EntityId>,
}

/// Partial update. Absent fields are left unchanged; `due_date: null`
/// clears the due date.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTask {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub priority: Option<TaskPriority>,
    pub team_id: Option<EntityId>,
    #[serde(default, deserialize_with = "double_option")]
    pub due_date: Option<Option<Timestamp>>,
}

fn double_option<'de, D>(deserializer: D) -> Result<Option<Option<Timestamp>>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Option::<Timestamp>::deserialize(deserializer).map(Some)
}

/// Query filters for listing tasks.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFilter {
    pub team_id: Option<EntityId>,
    pub status: Option<String>,
    pub user_id: Option<EntityId>,
}

/// Validated values for a new task.
#[derive(Debug, Clone)]
pub struct NewTask {
    pub title: String,
    pub description: String,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub team_id: EntityId,
    pub created_by: EntityId,
    pub due_date: Option<Timestamp>,
    pub assignees: Vec<EntityId>,
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    /// Newest first.
    async fn list(&self, filter: &TaskFilter) -> Vec<Task>;
    async fn find_by_id(&self, id: &str) -> Option<Task>;
    async fn create(&self, input: NewTask) -> Task;
    async fn update(&self, id: &str, input: &UpdateTask) -> Option<Task>;
    async fn set_status(&self, id: &str, status: TaskStatus) -> Option<Task>;
    async fn delete(&self, id: &str) -> bool;
    /// Append an assignee. The duplicate check and the append happen as one
    /// step, so concurrent requests for the same user assign them once.
    ///
    /// Fails with `NotFound` for an unknown task and `Validation` when the
    /// user is already assigned.
    async fn assign(&self, id: &str, user_id: &str) -> Result<Task, CoreError>;
}

/// Process-local [`TaskStore`].
#[derive(Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<EntityId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn list(&self, filter: &TaskFilter) -> Vec<Task> {
        let tasks = self.tasks.read().await;
        let mut matching: Vec<Task> = tasks
            .values()
            .filter(|t| filter.team_id.as_ref().map_or(true, |id| &t.team_id == id))
            .filter(|t| filter.status.as_ref().map_or(true, |s| t.status.as_str() == s))
            .filter(|t| filter.user_id.as_ref().map_or(true, |u| t.is_assigned(u)))
            .cloned()
            .collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        matching
    }

    async fn find_by_id(&self, id: &str) -> Option<Task> {
        self.tasks.read().await.get(id).cloned()
    }

    async fn create(&self, input: NewTask) -> Task {
        let now = Utc::now();
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            status: input.status,
            priority: input.priority,
            team_id: input.team_id,
            created_by: input.created_by,
            due_date: input.due_date,
            assignees: input
                .assignees
                .into_iter()
                .map(|user_id| Assignee {
                    user_id,
                    assigned_at: now,
                })
                .collect(),
            created_at: now,
            updated_at: now,
        };
        self.tasks.write().await.insert(task.id.clone(), task.clone());
        task
    }

    async fn update(&self, id: &str, input: &UpdateTask) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id)?;

        if let Some(title) = input.title.as_ref().filter(|t| !t.trim().is_empty()) {
            task.title = title.trim().to_string();
        }
        if let Some(description) = &input.description {
            task.description = description.clone();
        }
        if let Some(status) = input.status {
            task.status = status;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }
        if let Some(team_id) = input.team_id.as_ref().filter(|t| !t.is_empty()) {
            task.team_id = team_id.clone();
        }
        if let Some(due_date) = input.due_date {
            task.due_date = due_date;
        }
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    async fn set_status(&self, id: &str, status: TaskStatus) -> Option<Task> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id)?;
        task.status = status;
        task.updated_at = Utc::now();
        Some(task.clone())
    }

    async fn delete(&self, id: &str) -> bool {
        self.tasks.write().await.remove(id).is_some()
    }

    async fn assign(&self, id: &str, user_id: &str) -> Result<Task, CoreError> {
        let mut tasks = self.tasks.write().await;
        let task = tasks.get_mut(id).ok_or_else(|| CoreError::NotFound {
            entity: "Task",
            id: id.to_string(),
        })?;
        if task.is_assigned(user_id) {
            return Err(CoreError::Validation(
                "User is already assigned to this task".into(),
            ));
        }
        let now = Utc::now();
        task.assignees.push(Assignee {
            user_id: user_id.to_string(),
            assigned_at: now,
        });
        task.updated_at = now;
        Ok(task.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    fn new_task(title: &str, team_id: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            description: String::new(),
            status: TaskStatus::default(),
            priority: TaskPriority::default(),
            team_id: team_id.to_string(),
            created_by: "1".to_string(),
            due_date: None,
            assignees: Vec::new(),
        }
    }

    #[tokio::test]
    async fn list_filters_by_team_status_and_assignee() {
        let store = InMemoryTaskStore::new();
        let a = store.create(new_task("a", "p1")).await;
        let b = store.create(new_task("b", "p2")).await;
        store.set_status(&b.id, TaskStatus::Done).await;
        store.assign(&a.id, "9").await.unwrap();

        let by_team = store
            .list(&TaskFilter {
                team_id: Some("p1".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_team.len(), 1);
        assert_eq!(by_team[0].id, a.id);

        let by_status = store
            .list(&TaskFilter {
                status: Some("DONE".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_status.len(), 1);
        assert_eq!(by_status[0].id, b.id);

        let by_user = store
            .list(&TaskFilter {
                user_id: Some("9".into()),
                ..Default::default()
            })
            .await;
        assert_eq!(by_user.len(), 1);
        assert!(by_user[0].is_assigned("9"));
    }

    #[tokio::test]
    async fn update_leaves_absent_fields_unchanged() {
        let store = InMemoryTaskStore::new();
        let task = store.create(new_task("original", "p1")).await;

        let updated = store
            .update(
                &task.id,
                &UpdateTask {
                    priority: Some(TaskPriority::High),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, "original");
        assert_eq!(updated.team_id, "p1");
        assert_eq!(updated.priority, TaskPriority::High);
    }

    #[tokio::test]
    async fn missing_task_operations_return_none() {
        let store = InMemoryTaskStore::new();
        assert!(store.find_by_id("nope").await.is_none());
        assert!(store.set_status("nope", TaskStatus::Done).await.is_none());
        assert_matches!(
            store.assign("nope", "1").await,
            Err(CoreError::NotFound { entity: "Task", .. })
        );
        assert!(!store.delete("nope").await);
    }

    #[tokio::test]
    async fn assign_rejects_user_already_assigned() {
        let store = InMemoryTaskStore::new();
        let task = store.create(new_task("t", "p1")).await;

        let first = store.assign(&task.id, "9").await.unwrap();
        assert_eq!(first.assignees.len(), 1);

        assert_matches!(
            store.assign(&task.id, "9").await,
            Err(CoreError::Validation(_))
        );
        let stored = store.find_by_id(&task.id).await.unwrap();
        assert_eq!(stored.assignees.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_assigns_of_one_user_store_one_entry() {
        let store = std::sync::Arc::new(InMemoryTaskStore::new());
        let task = store.create(new_task("t", "p1")).await;

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = std::sync::Arc::clone(&store);
                let id = task.id.clone();
                tokio::spawn(async move { store.assign(&id, "9").await.is_ok() })
            })
            .collect();

        let mut assigned = 0;
        for handle in handles {
            if handle.await.unwrap() {
                assigned += 1;
            }
        }

        assert_eq!(assigned, 1);
        let stored = store.find_by_id(&task.id).await.unwrap();
        assert_eq!(stored.assignees.len(), 1);
    }

    #[test]
    fn update_distinguishes_null_from_absent_due_date() {
        let absent: UpdateTask = serde_json::from_str("{}").unwrap();
        let cleared: UpdateTask = serde_json::from_str(r#"{"dueDate":null}"#).unwrap();
        assert_eq!(absent.due_date, None);
        assert_eq!(cleared.due_date, Some(None));
    }
}
