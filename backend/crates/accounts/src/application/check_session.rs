//! Check Session Use Case
//!
//! Resolves a session token to the logged-in user.

use std::sync::Arc;

use chrono::Utc;
use platform::client::ClientFingerprint;

use crate::application::config::AccountsConfig;
use crate::application::session_token;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::error::AccountsResult;

pub struct CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository + Send + Sync + 'static,
{
    user_repo: Arc<U>,
    session_repo: Arc<S>,
    config: Arc<AccountsConfig>,
}

impl<U, S> CheckSessionUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository + Send + Sync + 'static,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AccountsConfig>) -> Self {
        Self {
            user_repo,
            session_repo,
            config,
        }
    }

    /// Returns `None` for a missing, forged, expired or foreign session,
    /// and for a user that has since been deactivated.
    pub async fn execute(
        &self,
        session_token: Option<&str>,
        fingerprint: &ClientFingerprint,
    ) -> AccountsResult<Option<User>> {
        let Some(session_id) =
            session_token.and_then(|t| session_token::verify(&self.config.session_secret, t))
        else {
            return Ok(None);
        };

        let Some(session) = self.session_repo.find_by_id(&session_id).await? else {
            return Ok(None);
        };

        if !fingerprint.matches(&session.client_fingerprint_hash) {
            tracing::warn!(
                session_id = %session_id,
                client_ip = ?fingerprint.ip,
                "Session presented by a different client"
            );
            return Ok(None);
        }

        let user = self
            .user_repo
            .find_by_id(&session.user_id)
            .await?
            .filter(User::can_login);

        if user.is_some() {
            // Update last activity in background
            let repo = self.session_repo.clone();
            tokio::spawn(async move {
                if let Err(e) = repo.touch(&session_id, Utc::now()).await {
                    tracing::warn!(error = %e, "Failed to update session activity");
                }
            });
        }

        Ok(user)
    }
}
