//! Team membership lookups against the team service.
//!
//! The gate asks "which teams am I in?" on behalf of the requester by
//! forwarding the requester's own bearer token, so the team service applies
//! its own authentication to the call.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::StatusCode;
use serde::{Deserialize, Deserializer};
use teamboard_core::types::EntityId;

/// Path of the team service endpoint returning the caller's project teams.
pub const MY_TEAMS_PATH: &str = "/api/project-teams/mine";

/// A project team the requester belongs to.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamRecord {
    /// Project the team is assigned to. Tasks carry this id as their `teamId`.
    #[serde(default, deserialize_with = "id_as_string")]
    pub project_id: Option<EntityId>,
    #[serde(default)]
    pub members: Vec<TeamMember>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamMember {
    #[serde(default, deserialize_with = "id_as_string")]
    pub user_id: Option<EntityId>,
    #[serde(default)]
    pub role: Option<String>,
}

/// Ids arrive as strings or numbers depending on the producing store.
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<EntityId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Why a membership lookup produced no answer.
#[derive(Debug, thiserror::Error)]
pub enum MembershipError {
    /// The team service rejected the forwarded credential (401).
    #[error("Membership lookup rejected the credential")]
    Unauthenticated,

    /// The team service refused the lookup (403).
    #[error("Membership lookup forbidden")]
    Forbidden,

    /// The team service could not be reached, answered with another failure
    /// status, or returned an undecodable body.
    #[error("Membership lookup unavailable: {0}")]
    Unavailable(String),
}

/// Source of the requester's team memberships.
#[async_trait]
pub trait MembershipSource: Send + Sync {
    /// Fetch the teams visible to the holder of `credential`.
    async fn my_teams(&self, credential: &str) -> Result<Vec<TeamRecord>, MembershipError>;
}

/// [`MembershipSource`] backed by the team service's HTTP API.
pub struct TeamServiceClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
}

impl TeamServiceClient {
    /// * `base_url` - e.g. `http://team-service:8082` (no trailing slash).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Self {
        Self::with_client(reqwest::Client::new(), base_url, timeout)
    }

    /// Create a client reusing an existing [`reqwest::Client`].
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl MembershipSource for TeamServiceClient {
    async fn my_teams(&self, credential: &str) -> Result<Vec<TeamRecord>, MembershipError> {
        let url = format!("{}{MY_TEAMS_PATH}", self.base_url);

        let response = self
            .client
            .get(&url)
            .bearer_auth(credential)
            .header(ACCEPT, "application/json")
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| MembershipError::Unavailable(format!("request failed: {e}")))?;

        match response.status() {
            StatusCode::UNAUTHORIZED => return Err(MembershipError::Unauthenticated),
            StatusCode::FORBIDDEN => return Err(MembershipError::Forbidden),
            status if !status.is_success() => {
                return Err(MembershipError::Unavailable(format!(
                    "team service answered {status}"
                )));
            }
            _ => {}
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| MembershipError::Unavailable(format!("invalid body: {e}")))?;

        decode_teams(body)
    }
}

/// Decode a "my teams" body. A JSON value that is not an array means the
/// requester has no teams.
pub fn decode_teams(body: serde_json::Value) -> Result<Vec<TeamRecord>, MembershipError> {
    if !body.is_array() {
        tracing::debug!("Membership body is not an array, treating as no teams");
        return Ok(Vec::new());
    }
    serde_json::from_value(body)
        .map_err(|e| MembershipError::Unavailable(format!("invalid team record: {e}")))
}
