//! Pending account registrations awaiting admin review.
//!
//! Only the review workflow lives here: signup records a pending entry,
//! admins activate or reject it. Credentials are handled by the user
//! service's own login flow.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use teamboard_core::types::{EntityId, Timestamp};
use tokio::sync::RwLock;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub id: EntityId,
    pub username: String,
    pub email: String,
    pub role: String,
    pub active: bool,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRegistration {
    pub username: Option<String>,
    pub email: Option<String>,
    pub role: Option<String>,
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Fails with the conflicting field name when the username or email is
    /// already registered.
    async fn create(
        &self,
        username: &str,
        email: &str,
        role: &str,
    ) -> Result<Registration, &'static str>;
    /// Registrations not yet activated, oldest first.
    async fn list_pending(&self) -> Vec<Registration>;
    /// Mark a registration active. Returns `false` if it does not exist.
    async fn activate(&self, id: &str) -> bool;
    /// Remove a registration that is still pending. Returns `false` if there
    /// is no pending registration with this id.
    async fn reject(&self, id: &str) -> bool;
}

#[derive(Default)]
pub struct InMemoryRegistrationStore {
    entries: RwLock<HashMap<EntityId, Registration>>,
}

impl InMemoryRegistrationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RegistrationStore for InMemoryRegistrationStore {
    async fn create(
        &self,
        username: &str,
        email: &str,
        role: &str,
    ) -> Result<Registration, &'static str> {
        let mut entries = self.entries.write().await;

        if entries.values().any(|r| r.username == username) {
            return Err("username");
        }
        if entries.values().any(|r| r.email.eq_ignore_ascii_case(email)) {
            return Err("email");
        }

        let registration = Registration {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.to_string(),
            email: email.to_string(),
            role: role.to_string(),
            active: false,
            created_at: Utc::now(),
        };
        entries.insert(registration.id.clone(), registration.clone());
        Ok(registration)
    }

    async fn list_pending(&self) -> Vec<Registration> {
        let entries = self.entries.read().await;
        let mut pending: Vec<Registration> =
            entries.values().filter(|r| !r.active).cloned().collect();
        pending.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        pending
    }

    async fn activate(&self, id: &str) -> bool {
        match self.entries.write().await.get_mut(id) {
            Some(entry) => {
                entry.active = true;
                true
            }
            None => false,
        }
    }

    async fn reject(&self, id: &str) -> bool {
        let mut entries = self.entries.write().await;
        match entries.get(id) {
            Some(entry) if !entry.active => entries.remove(id).is_some(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn duplicate_username_or_email_is_rejected() {
        let store = InMemoryRegistrationStore::new();
        store.create("ana", "ana@example.com", "MEMBER").await.unwrap();

        assert_eq!(
            store.create("ana", "other@example.com", "MEMBER").await,
            Err("username")
        );
        assert_eq!(
            store.create("bob", "ANA@example.com", "MEMBER").await,
            Err("email")
        );
    }

    #[tokio::test]
    async fn activated_entries_leave_the_pending_list() {
        let store = InMemoryRegistrationStore::new();
        let a = store.create("ana", "ana@example.com", "MEMBER").await.unwrap();
        let b = store.create("bob", "bob@example.com", "MEMBER").await.unwrap();

        assert!(store.activate(&a.id).await);

        let pending = store.list_pending().await;
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].id, b.id);
    }

    #[tokio::test]
    async fn reject_only_removes_pending_entries() {
        let store = InMemoryRegistrationStore::new();
        let a = store.create("ana", "ana@example.com", "MEMBER").await.unwrap();
        store.activate(&a.id).await;

        assert!(!store.reject(&a.id).await);
        assert!(!store.reject("missing").await);

        let b = store.create("bob", "bob@example.com", "MEMBER").await.unwrap();
        assert!(store.reject(&b.id).await);
        assert!(store.list_pending().await.is_empty());
    }
}
