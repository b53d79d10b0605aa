//! Repository Traits
//!
//! Interfaces for data persistence. Implementations are in the infra layer.

use chrono::{DateTime, Utc};
use kernel::id::{SessionId, UserId};

use crate::domain::entity::{session::Session, user::User};
use crate::domain::value_object::{email::Email, user_name::UserName};
use crate::error::AccountsResult;

/// User repository trait
#[trait_variant::make(UserRepository: Send)]
pub trait LocalUserRepository {
    /// Create a new user
    ///
    /// Fails with `AccountsError::Duplicate` (or a unique-violation database
    /// error) when the user name or email is already taken.
    async fn create(&self, user: &User) -> AccountsResult<()>;

    async fn find_by_id(&self, user_id: &UserId) -> AccountsResult<Option<User>>;

    async fn find_by_user_name(&self, user_name: &UserName) -> AccountsResult<Option<User>>;

    async fn exists_by_user_name(&self, user_name: &UserName) -> AccountsResult<bool>;

    async fn exists_by_email(&self, email: &Email) -> AccountsResult<bool>;

    /// Update mutable fields (password, active flag, login time)
    async fn update(&self, user: &User) -> AccountsResult<()>;
}

/// Session repository trait
#[trait_variant::make(SessionRepository: Send)]
pub trait LocalSessionRepository {
    async fn create(&self, session: &Session) -> AccountsResult<()>;

    /// Find a session that has not expired yet
    async fn find_by_id(&self, session_id: &SessionId) -> AccountsResult<Option<Session>>;

    /// Record activity on a session
    async fn touch(&self, session_id: &SessionId, at: DateTime<Utc>) -> AccountsResult<()>;

    /// Delete a session; deleting a missing session is not an error
    async fn delete(&self, session_id: &SessionId) -> AccountsResult<()>;

    /// Delete expired sessions, returning how many were removed
    async fn cleanup_expired(&self) -> AccountsResult<u64>;
}

/// Everything the HTTP layer needs from a single backing store
pub trait AccountsRepository:
    UserRepository + SessionRepository + Clone + Send + Sync + 'static
{
}

impl<T> AccountsRepository for T where
    T: UserRepository + SessionRepository + Clone + Send + Sync + 'static
{
}
