use std::sync::Arc;

use teamboard_events::EventHub;

use crate::config::ServerConfig;
use crate::gate::AuthorizationGate;
use crate::store::{RegistrationStore, TaskStore};

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration (JWT settings, timeouts, team service).
    pub config: Arc<ServerConfig>,
    /// Principal-keyed registry behind `/notifications/stream`: task
    /// broadcasts and per-user assignment notices.
    pub hub: Arc<EventHub>,
    /// Role-keyed registry behind `/notifications/role-stream`: review-queue
    /// notices for admins.
    pub role_hub: Arc<EventHub>,
    /// Project-leadership checks for task mutations.
    pub gate: Arc<AuthorizationGate>,
    pub tasks: Arc<dyn TaskStore>,
    pub registrations: Arc<dyn RegistrationStore>,
}
