use std::fmt;

use serde::Serialize;
use teamboard_core::types::EntityId;

/// Identity a connection is registered under for targeted delivery.
///
/// The variant is part of the key, so the role `"42"` and the principal
/// `"42"` address different connection sets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum SubscriberKey {
    Principal(EntityId),
    Role(String),
}

impl SubscriberKey {
    pub fn principal(id: impl Into<EntityId>) -> Self {
        SubscriberKey::Principal(id.into())
    }

    pub fn role(name: impl Into<String>) -> Self {
        SubscriberKey::Role(name.into())
    }
}

impl fmt::Display for SubscriberKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SubscriberKey::Principal(id) => write!(f, "principal:{id}"),
            SubscriberKey::Role(role) => write!(f, "role:{role}"),
        }
    }
}
