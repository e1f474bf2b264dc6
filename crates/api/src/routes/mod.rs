pub mod health;
pub mod registration;
pub mod task;

use axum::routing::get;
use axum::Router;

use crate::state::AppState;
use crate::stream;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /notifications/stream                 task stream, keyed by user (auth required)
/// /notifications/role-stream            review-queue stream, keyed by role (auth required)
///
/// /tasks                                list, create
/// /tasks/{id}                           get, update, delete
/// /tasks/{id}/status                    change status (PATCH)
/// /tasks/{id}/assign                    assign a user (POST)
///
/// /registrations                        signup (public)
/// /registrations/pending                pending queue (admin)
/// /registrations/{id}/activate          activate (admin)
/// /registrations/{id}                   reject (admin, DELETE)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/notifications/stream", get(stream::principal_stream))
        .route("/notifications/role-stream", get(stream::role_stream))
        .nest("/tasks", task::router())
        .nest("/registrations", registration::router())
}
