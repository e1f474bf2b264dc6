//! Route definitions for the `/registrations` resource.

use axum::routing::{delete, get, post};
use axum::Router;

use crate::handlers::registration;
use crate::state::AppState;

/// Routes mounted at `/registrations`.
///
/// ```text
/// POST   /                 -> create (public signup)
/// GET    /pending          -> list_pending (admin)
/// POST   /{id}/activate    -> activate (admin)
/// DELETE /{id}             -> reject (admin)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(registration::create))
        .route("/pending", get(registration::list_pending))
        .route("/{id}/activate", post(registration::activate))
        .route("/{id}", delete(registration::reject))
}
