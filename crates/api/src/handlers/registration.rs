//! Handlers for the `/registrations` review queue.
//!
//! Admins watching the role stream are told when the queue grows and when an
//! entry is resolved.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;
use teamboard_core::error::CoreError;
use teamboard_core::roles::{ROLE_ADMIN, ROLE_MEMBER};
use teamboard_core::types::EntityId;
use teamboard_events::event_types::{PENDING_CREATED, PENDING_RESOLVED};
use teamboard_events::{Event, SubscriberKey};

use crate::error::{AppError, AppResult};
use crate::middleware::rbac::RequireAdmin;
use crate::response::DataResponse;
use crate::state::AppState;
use crate::store::registration::{CreateRegistration, Registration};

fn admins() -> SubscriberKey {
    SubscriberKey::role(ROLE_ADMIN)
}

/// POST /api/v1/registrations (public)
pub async fn create(
    State(state): State<AppState>,
    Json(input): Json<CreateRegistration>,
) -> AppResult<(StatusCode, Json<Registration>)> {
    let username = input.username.as_deref().map(str::trim).unwrap_or_default();
    let email = input.email.as_deref().map(str::trim).unwrap_or_default();
    if username.is_empty() || email.is_empty() {
        return Err(AppError::Core(CoreError::Validation(
            "Username and email are required".into(),
        )));
    }
    if !email.contains('@') {
        return Err(AppError::Core(CoreError::Validation(
            "Email address is invalid".into(),
        )));
    }
    let role = input
        .role
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .unwrap_or(ROLE_MEMBER);

    let registration = state
        .registrations
        .create(username, email, role)
        .await
        .map_err(|field| {
            AppError::Core(CoreError::Conflict(format!("That {field} is already registered")))
        })?;

    tracing::info!(registration_id = %registration.id, username = %registration.username, "Registration pending");
    state
        .role_hub
        .publish_to(
            &admins(),
            Event::new(
                PENDING_CREATED,
                json!({
                    "id": registration.id,
                    "username": registration.username,
                    "email": registration.email,
                    "role": registration.role,
                }),
            ),
        )
        .await;

    Ok((StatusCode::CREATED, Json(registration)))
}

/// GET /api/v1/registrations/pending (admin)
pub async fn list_pending(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> AppResult<Json<DataResponse<Vec<Registration>>>> {
    let pending = state.registrations.list_pending().await;
    Ok(Json(DataResponse { data: pending }))
}

/// POST /api/v1/registrations/{id}/activate (admin)
pub async fn activate(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<StatusCode> {
    if !state.registrations.activate(&id).await {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Registration",
            id,
        }));
    }

    tracing::info!(registration_id = %id, admin_id = %admin.user_id, "Registration activated");
    state
        .role_hub
        .publish_to(&admins(), Event::new(PENDING_RESOLVED, json!({ "id": id })))
        .await;

    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/registrations/{id} (admin)
///
/// Only pending entries can be rejected.
pub async fn reject(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<EntityId>,
) -> AppResult<StatusCode> {
    if !state.registrations.reject(&id).await {
        return Err(AppError::Core(CoreError::NotFound {
            entity: "Pending registration",
            id,
        }));
    }

    tracing::info!(registration_id = %id, admin_id = %admin.user_id, "Registration rejected");
    state
        .role_hub
        .publish_to(
            &admins(),
            Event::new(PENDING_RESOLVED, json!({ "id": id, "action": "rejected" })),
        )
        .await;

    Ok(StatusCode::NO_CONTENT)
}
