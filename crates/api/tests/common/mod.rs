#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tower::ServiceExt;

use teamboard_api::auth::jwt::{generate_access_token, JwtConfig};
use teamboard_api::config::ServerConfig;
use teamboard_api::gate::membership::{
    MembershipError, MembershipSource, TeamMember, TeamRecord,
};
use teamboard_api::gate::AuthorizationGate;
use teamboard_api::router::build_app_router;
use teamboard_api::state::AppState;
use teamboard_api::store::{InMemoryRegistrationStore, InMemoryTaskStore};
use teamboard_events::EventHub;

pub const TEST_JWT_SECRET: &str = "test-secret-that-is-long-enough-for-hmac";

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        service_name: "teamboard-test".to_string(),
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        shutdown_timeout_secs: 30,
        heartbeat_interval_secs: 25,
        team_service_url: "http://127.0.0.1:9".to_string(),
        team_service_timeout_secs: 5,
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            access_token_expiry_mins: 60,
        },
    }
}

/// Issue a valid access token for the test secret.
pub fn token(user_id: &str, role: &str) -> String {
    generate_access_token(user_id, role, &test_config().jwt).expect("token generation")
}

// ---------------------------------------------------------------------------
// Membership fakes
// ---------------------------------------------------------------------------

/// Fixed membership answer with a call counter.
pub struct StaticMembership {
    answer: Result<Vec<TeamRecord>, fn() -> MembershipError>,
    calls: AtomicUsize,
}

impl StaticMembership {
    pub fn teams(teams: Vec<TeamRecord>) -> Arc<Self> {
        Arc::new(Self {
            answer: Ok(teams),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn failing(error: fn() -> MembershipError) -> Arc<Self> {
        Arc::new(Self {
            answer: Err(error),
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MembershipSource for StaticMembership {
    async fn my_teams(&self, _credential: &str) -> Result<Vec<TeamRecord>, MembershipError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.answer {
            Ok(teams) => Ok(teams.clone()),
            Err(make) => Err(make()),
        }
    }
}

/// A team assigned to `project_id` with the given `(user_id, role)` members.
pub fn team(project_id: &str, members: &[(&str, &str)]) -> TeamRecord {
    TeamRecord {
        project_id: Some(project_id.to_string()),
        members: members
            .iter()
            .map(|(user_id, role)| TeamMember {
                user_id: Some(user_id.to_string()),
                role: Some(role.to_string()),
            })
            .collect(),
    }
}

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build state with isolated stores and hubs around the given membership source.
pub fn build_test_state(membership: Arc<dyn MembershipSource>) -> AppState {
    build_test_state_with(test_config(), membership)
}

pub fn build_test_state_with(
    config: ServerConfig,
    membership: Arc<dyn MembershipSource>,
) -> AppState {
    AppState {
        config: Arc::new(config),
        hub: Arc::new(EventHub::new()),
        role_hub: Arc::new(EventHub::new()),
        gate: Arc::new(AuthorizationGate::new(membership)),
        tasks: Arc::new(InMemoryTaskStore::new()),
        registrations: Arc::new(InMemoryRegistrationStore::new()),
    }
}

/// Build the full application router with all middleware layers.
///
/// Uses the same builder as `main.rs` so integration tests exercise the
/// production middleware stack.
pub fn build_test_app(state: AppState) -> Router {
    let config = state.config.as_ref().clone();
    build_app_router(state, &config)
}

/// Serve `app` on an ephemeral local port.
pub async fn spawn_app(app: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral port");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server");
    });
    addr
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(
    app: Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<serde_json::Value>,
) -> Response<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None, None).await
}

pub async fn get_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::GET, uri, Some(token), None).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, None, Some(body)).await
}

pub async fn post_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), Some(body)).await
}

pub async fn put_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PUT, uri, Some(token), Some(body)).await
}

pub async fn patch_json_auth(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    token: &str,
) -> Response<Body> {
    send(app, Method::PATCH, uri, Some(token), Some(body)).await
}

pub async fn post_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::POST, uri, Some(token), None).await
}

pub async fn delete_auth(app: Router, uri: &str, token: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, Some(token), None).await
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}
