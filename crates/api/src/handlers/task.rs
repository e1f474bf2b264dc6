//! Handlers for the `/tasks` resource.
//!
//! Every mutation runs in the same order: input validation, existence check,
//! project-leadership check, write, then event publication. A rejected
//! request therefore never reaches the hub.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use teamboard_core::error::CoreError;
use teamboard_core::task_status::validate_task_status;
use teamboard_core::types::EntityId;
use teamboard_events::event_types::{
    TASK_ASSIGNED, TASK_CREATED, TASK_DELETED, TASK_STATUS_CHANGED, TASK_UPDATED,
};
use teamboard_events::{Event, SubscriberKey};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::store::task::{CreateTask, NewTask, Task, TaskFilter, UpdateTask};

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRequest {
    pub user_id: Option<EntityId>,
}

fn task_not_found(id: EntityId) -> AppError {
    AppError::Core(CoreError::NotFound { entity: "Task", id })
}

async fn find_task(state: &AppState, id: &str) -> AppResult<Task> {
    state
        .tasks
        .find_by_id(id)
        .await
        .ok_or_else(|| task_not_found(id.to_string()))
}

/// `{taskId, teamId}`, the payload shared by most task events.
fn task_ref(task: &Task) -> serde_json::Value {
    json!({ "taskId": task.id, "teamId": task.team_id })
}

/// GET /api/v1/tasks?teamId=&status=&userId=
pub async fn list(
    _user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<TaskFilter>,
) -> AppResult<Json<DataResponse<Vec<Task>>>> {
    let tasks = state.tasks.list(&filter).await;
    Ok(Json(DataResponse { data: tasks }))
}

/// GET /api/v1/tasks/{id}
pub async fn get_by_id(
    _user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<Json<Task>> {
    Ok(Json(find_task(&state, &id).await?))
}

/// POST /api/v1/tasks
pub async fn create(
    user: AuthUser,
    State(state): State<AppState>,
    Json(input): Json<CreateTask>,
) -> AppResult<(StatusCode, Json<Task>)> {
    let title = input.title.as_deref().map(str::trim).unwrap_or_default();
    let team_id = input.team_id.as_deref().map(str::trim).unwrap_or_default();
    if title.is_empty() || team_id.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Title and teamId are required".into(),
        )));
    }

    state.gate.require_leader_or_admin(&user, team_id).await?;

    let task = state
        .tasks
        .create(NewTask {
            title: title.to_string(),
            description: input.description.unwrap_or_default(),
            status: input.status.unwrap_or_default(),
            priority: input.priority.unwrap_or_default(),
            team_id: team_id.to_string(),
            created_by: user.user_id.clone(),
            due_date: input.due_date,
            assignees: input.assignees,
        })
        .await;

    tracing::info!(task_id = %task.id, team_id = %task.team_id, user_id = %user.user_id, "Task created");
    state.hub.publish(Event::new(TASK_CREATED, task_ref(&task))).await;

    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/v1/tasks/{id}
///
/// Moving a task to another project requires leadership of both projects.
pub async fn update(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<UpdateTask>,
) -> AppResult<Json<Task>> {
    let current = find_task(&state, &id).await?;

    state
        .gate
        .require_leader_or_admin(&user, &current.team_id)
        .await?;
    if let Some(target) = input
        .team_id
        .as_deref()
        .filter(|t| !t.is_empty() && *t != current.team_id)
    {
        state.gate.require_leader_or_admin(&user, target).await?;
    }

    let task = state
        .tasks
        .update(&id, &input)
        .await
        .ok_or_else(|| task_not_found(id.clone()))?;

    state.hub.publish(Event::new(TASK_UPDATED, task_ref(&task))).await;

    Ok(Json(task))
}

/// PATCH /api/v1/tasks/{id}/status
pub async fn update_status(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<UpdateStatusRequest>,
) -> AppResult<Json<Task>> {
    let status = validate_task_status(input.status.as_deref().unwrap_or_default())
        .map_err(|e| AppError::Core(CoreError::Validation(e)))?;

    let current = find_task(&state, &id).await?;
    state
        .gate
        .require_leader_or_admin(&user, &current.team_id)
        .await?;

    let task = state
        .tasks
        .set_status(&id, status)
        .await
        .ok_or_else(|| task_not_found(id.clone()))?;

    tracing::info!(task_id = %task.id, status = %task.status, "Task status changed");
    state
        .hub
        .publish(Event::new(
            TASK_STATUS_CHANGED,
            json!({ "taskId": task.id, "teamId": task.team_id, "status": task.status }),
        ))
        .await;

    Ok(Json(task))
}

/// DELETE /api/v1/tasks/{id}
pub async fn delete(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<StatusCode> {
    let task = find_task(&state, &id).await?;
    state
        .gate
        .require_leader_or_admin(&user, &task.team_id)
        .await?;

    if !state.tasks.delete(&id).await {
        return Err(task_not_found(id));
    }

    tracing::info!(task_id = %task.id, team_id = %task.team_id, "Task deleted");
    state.hub.publish(Event::new(TASK_DELETED, task_ref(&task))).await;

    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/tasks/{id}/assign
///
/// Notifies the assignee directly with `task_assigned`, then broadcasts
/// `task_updated` so every board refreshes.
pub async fn assign(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
    Json(input): Json<AssignRequest>,
) -> AppResult<Json<Task>> {
    let assignee = input
        .user_id
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| AppError::Core(CoreError::Validation("User ID is required".into())))?
        .to_string();

    let current = find_task(&state, &id).await?;
    if current.is_assigned(&assignee) {
        return Err(AppError::Core(CoreError::Validation(
            "User is already assigned to this task".into(),
        )));
    }

    state
        .gate
        .require_leader_or_admin(&user, &current.team_id)
        .await?;

    // Duplicates are checked again under the store lock.
    let task = state.tasks.assign(&id, &assignee).await?;

    let assigned_at = task
        .assignees
        .iter()
        .rev()
        .find(|a| a.user_id == assignee)
        .map(|a| a.assigned_at);

    state
        .hub
        .publish_to(
            &SubscriberKey::principal(assignee.clone()),
            Event::new(
                TASK_ASSIGNED,
                json!({
                    "taskId": task.id,
                    "title": task.title,
                    "status": task.status,
                    "teamId": task.team_id,
                    "assignedAt": assigned_at,
                }),
            ),
        )
        .await;
    state.hub.publish(Event::new(TASK_UPDATED, task_ref(&task))).await;

    tracing::info!(task_id = %task.id, assignee = %assignee, "Task assigned");
    Ok(Json(task))
}
