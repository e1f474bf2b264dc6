//! Well-known role name constants.
//!
//! Account roles are carried in the access token's `role` claim. Team roles
//! are carried per member in the team service's membership records.

/// Account role with unconditional mutation rights.
pub const ROLE_ADMIN: &str = "ADMIN";
pub const ROLE_MEMBER: &str = "MEMBER";

/// Team role that may mutate resources scoped to the team's project.
pub const TEAM_ROLE_LEADER: &str = "TEAM_LEADER";
