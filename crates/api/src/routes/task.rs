//! Route definitions for the `/tasks` resource.

use axum::routing::{get, patch, post};
use axum::Router;

use crate::handlers::task;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                 -> list (?teamId, status, userId)
/// POST   /                 -> create
/// GET    /{id}             -> get_by_id
/// PUT    /{id}             -> update
/// DELETE /{id}             -> delete
/// PATCH  /{id}/status      -> update_status
/// POST   /{id}/assign      -> assign
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(task::list).post(task::create))
        .route(
            "/{id}",
            get(task::get_by_id).put(task::update).delete(task::delete),
        )
        .route("/{id}/status", patch(task::update_status))
        .route("/{id}/assign", post(task::assign))
}
