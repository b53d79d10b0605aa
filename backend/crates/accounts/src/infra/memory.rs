//! In-memory Repository Implementation
//!
//! Same uniqueness and expiry semantics as the PostgreSQL repository.
//! Used by tests and when no database is configured.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};
use tokio::sync::RwLock;

use crate::domain::entity::{session::Session, user::User};
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::{AccountsError, AccountsResult};

#[derive(Default)]
struct Store {
    users: HashMap<UserId, User>,
    sessions: HashMap<SessionId, Session>,
}

#[derive(Clone, Default)]
pub struct MemoryAccountsRepository {
    store: Arc<RwLock<Store>>,
}

impl MemoryAccountsRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserRepository for MemoryAccountsRepository {
    async fn create(&self, user: &User) -> AccountsResult<()> {
        let mut store = self.store.write().await;

        if store.users.values().any(|u| u.user_name == user.user_name) {
            return Err(AccountsError::Duplicate("username"));
        }
        if store.users.values().any(|u| u.email == user.email) {
            return Err(AccountsError::Duplicate("email"));
        }

        store.users.insert(user.user_id, user.clone());
        Ok(())
    }

    async fn find_by_id(&self, user_id: &UserId) -> AccountsResult<Option<User>> {
        Ok(self.store.read().await.users.get(user_id).cloned())
    }

    async fn find_by_user_name(&self, user_name: &UserName) -> AccountsResult<Option<User>> {
        let store = self.store.read().await;
        Ok(store
            .users
            .values()
            .find(|u| &u.user_name == user_name)
            .cloned())
    }

    async fn exists_by_user_name(&self, user_name: &UserName) -> AccountsResult<bool> {
        let store = self.store.read().await;
        Ok(store.users.values().any(|u| &u.user_name == user_name))
    }

    async fn exists_by_email(&self, email: &Email) -> AccountsResult<bool> {
        let store = self.store.read().await;
        Ok(store.users.values().any(|u| &u.email == email))
    }

    async fn update(&self, user: &User) -> AccountsResult<()> {
        let mut store = self.store.write().await;
        if let Some(stored) = store.users.get_mut(&user.user_id) {
            stored.password = user.password.clone();
            stored.is_active = user.is_active;
            stored.last_login_at = user.last_login_at;
            stored.updated_at = user.updated_at;
        }
        Ok(())
    }
}

impl SessionRepository for MemoryAccountsRepository {
    async fn create(&self, session: &Session) -> AccountsResult<()> {
        let mut store = self.store.write().await;
        store.sessions.insert(session.session_id, session.clone());
        Ok(())
    }

    async fn find_by_id(&self, session_id: &SessionId) -> AccountsResult<Option<Session>> {
        let store = self.store.read().await;
        Ok(store
            .sessions
            .get(session_id)
            .filter(|s| !s.is_expired())
            .cloned())
    }

    async fn touch(&self, session_id: &SessionId, at: DateTime<Utc>) -> AccountsResult<()> {
        let mut store = self.store.write().await;
        if let Some(session) = store.sessions.get_mut(session_id) {
            session.last_activity_at = at;
        }
        Ok(())
    }

    async fn delete(&self, session_id: &SessionId) -> AccountsResult<()> {
        self.store.write().await.sessions.remove(session_id);
        Ok(())
    }

    async fn cleanup_expired(&self) -> AccountsResult<u64> {
        let mut store = self.store.write().await;
        let before = store.sessions.len();
        store.sessions.retain(|_, s| !s.is_expired());
        let deleted = (before - store.sessions.len()) as u64;

        tracing::info!(sessions_deleted = deleted, "Cleaned up expired sessions");

        Ok(deleted)
    }
}
