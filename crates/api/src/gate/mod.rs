//! Project-leadership authorization for mutating team-scoped resources.
//!
//! A requester may mutate a resource scoped to a project when they hold the
//! `ADMIN` account role, or when the team service lists them as
//! `TEAM_LEADER` of a team assigned to that project. Every decision for a
//! non-admin costs exactly one membership lookup; nothing is cached and
//! nothing is retried.
//!
//! | Condition                                  | Outcome                   |
//! |--------------------------------------------|---------------------------|
//! | Role is `ADMIN`                            | allowed, no remote call   |
//! | No credential                              | Unauthenticated (401)     |
//! | Team service answers 401                   | Unauthenticated (401)     |
//! | Team service answers 403                   | Forbidden (403)           |
//! | Team service unreachable / failed / garbled| ServiceUnavailable (503)  |
//! | Requester not leader of the project's team | Forbidden (403)           |

pub mod membership;

use std::sync::Arc;

use teamboard_core::error::CoreError;
use teamboard_core::roles::{ROLE_ADMIN, TEAM_ROLE_LEADER};

use crate::middleware::auth::AuthUser;
use membership::{MembershipError, MembershipSource, TeamRecord};

/// Who is asking, as seen by this service.
#[derive(Debug, Clone)]
pub struct Requester {
    pub principal_id: String,
    pub role: String,
    /// The inbound bearer token, forwarded to the team service as is.
    pub credential: Option<String>,
}

impl From<&AuthUser> for Requester {
    fn from(user: &AuthUser) -> Self {
        Self {
            principal_id: user.user_id.clone(),
            role: user.role.clone(),
            credential: Some(user.token.clone()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecisionReason {
    Administrator,
    TeamLeader,
    Unauthenticated,
    Forbidden,
    ServiceUnavailable,
}

/// Outcome of one authorization check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationDecision {
    pub allowed: bool,
    pub reason: DecisionReason,
}

impl AuthorizationDecision {
    fn allow(reason: DecisionReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }

    /// Map the decision onto the domain error handlers return.
    pub fn into_result(self) -> Result<(), CoreError> {
        match self.reason {
            DecisionReason::Administrator | DecisionReason::TeamLeader => Ok(()),
            DecisionReason::Unauthenticated => {
                Err(CoreError::Unauthorized("Authentication required".into()))
            }
            DecisionReason::Forbidden => Err(CoreError::Forbidden(
                "Only the team leader of the assigned team can modify this resource".into(),
            )),
            DecisionReason::ServiceUnavailable => Err(CoreError::ServiceUnavailable(
                "Unable to validate team leadership right now".into(),
            )),
        }
    }
}

/// Decides whether a requester may mutate resources of a project.
pub struct AuthorizationGate {
    membership: Arc<dyn MembershipSource>,
}

impl AuthorizationGate {
    pub fn new(membership: Arc<dyn MembershipSource>) -> Self {
        Self { membership }
    }

    pub async fn authorize(&self, requester: &Requester, project_id: &str) -> AuthorizationDecision {
        if requester.role == ROLE_ADMIN {
            return AuthorizationDecision::allow(DecisionReason::Administrator);
        }

        let Some(credential) = requester.credential.as_deref().filter(|c| !c.is_empty()) else {
            return AuthorizationDecision::deny(DecisionReason::Unauthenticated);
        };

        let teams = match self.membership.my_teams(credential).await {
            Ok(teams) => teams,
            Err(MembershipError::Unauthenticated) => {
                return AuthorizationDecision::deny(DecisionReason::Unauthenticated);
            }
            Err(MembershipError::Forbidden) => {
                return AuthorizationDecision::deny(DecisionReason::Forbidden);
            }
            Err(MembershipError::Unavailable(detail)) => {
                tracing::warn!(
                    principal_id = %requester.principal_id,
                    project_id,
                    error = %detail,
                    "Membership lookup failed",
                );
                return AuthorizationDecision::deny(DecisionReason::ServiceUnavailable);
            }
        };

        if is_leader_for_project(&teams, &requester.principal_id, project_id) {
            AuthorizationDecision::allow(DecisionReason::TeamLeader)
        } else {
            tracing::debug!(
                principal_id = %requester.principal_id,
                project_id,
                teams = teams.len(),
                "Requester is not a leader of the project",
            );
            AuthorizationDecision::deny(DecisionReason::Forbidden)
        }
    }

    /// [`authorize`](Self::authorize) for an authenticated user, as a
    /// handler-ready result.
    pub async fn require_leader_or_admin(
        &self,
        user: &AuthUser,
        project_id: &str,
    ) -> Result<(), CoreError> {
        self.authorize(&Requester::from(user), project_id)
            .await
            .into_result()
    }
}

/// True when some team assigned to `project_id` lists `principal_id` as
/// `TEAM_LEADER`.
pub fn is_leader_for_project(teams: &[TeamRecord], principal_id: &str, project_id: &str) -> bool {
    teams
        .iter()
        .filter(|team| team.project_id.as_deref() == Some(project_id))
        .flat_map(|team| team.members.iter())
        .any(|member| {
            member.user_id.as_deref() == Some(principal_id)
                && member.role.as_deref() == Some(TEAM_ROLE_LEADER)
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use membership::TeamMember;

    fn team(project: &str, members: &[(&str, &str)]) -> TeamRecord {
        TeamRecord {
            project_id: Some(project.to_string()),
            members: members
                .iter()
                .map(|(user, role)| TeamMember {
                    user_id: Some(user.to_string()),
                    role: Some(role.to_string()),
                })
                .collect(),
        }
    }

    #[test]
    fn leader_of_matching_project() {
        let teams = vec![team("p1", &[("7", "TEAM_LEADER"), ("8", "MEMBER")])];
        assert!(is_leader_for_project(&teams, "7", "p1"));
    }

    #[test]
    fn member_is_not_leader() {
        let teams = vec![team("p1", &[("7", "TEAM_LEADER"), ("8", "MEMBER")])];
        assert!(!is_leader_for_project(&teams, "8", "p1"));
    }

    #[test]
    fn leader_of_other_project_is_not_leader() {
        let teams = vec![team("p2", &[("7", "TEAM_LEADER")])];
        assert!(!is_leader_for_project(&teams, "7", "p1"));
    }

    #[test]
    fn decision_maps_to_core_errors() {
        assert!(AuthorizationDecision::allow(DecisionReason::TeamLeader)
            .into_result()
            .is_ok());
        assert!(matches!(
            AuthorizationDecision::deny(DecisionReason::Unauthenticated).into_result(),
            Err(CoreError::Unauthorized(_))
        ));
        assert!(matches!(
            AuthorizationDecision::deny(DecisionReason::Forbidden).into_result(),
            Err(CoreError::Forbidden(_))
        ));
        assert!(matches!(
            AuthorizationDecision::deny(DecisionReason::ServiceUnavailable).into_result(),
            Err(CoreError::ServiceUnavailable(_))
        ));
    }
}
