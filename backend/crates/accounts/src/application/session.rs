//! Session Establishment
//!
//! Shared by signup and login: rotate any presented session, store a new
//! one and sign its token.

use std::sync::Arc;

use platform::client::ClientFingerprint;

use crate::application::config::AccountsConfig;
use crate::application::session_token;
use crate::domain::entity::{session::Session, user::User};
use crate::domain::repository::SessionRepository;
use crate::error::{AccountsError, AccountsResult};

pub struct EstablishSession<S>
where
    S: SessionRepository,
{
    session_repo: Arc<S>,
    config: Arc<AccountsConfig>,
}

impl<S> EstablishSession<S>
where
    S: SessionRepository,
{
    pub fn new(session_repo: Arc<S>, config: Arc<AccountsConfig>) -> Self {
        Self {
            session_repo,
            config,
        }
    }

    /// Returns the signed token for the new session
    pub async fn execute(
        &self,
        user: &User,
        fingerprint: &ClientFingerprint,
        previous_token: Option<&str>,
    ) -> AccountsResult<(Session, String)> {
        // Never reuse a session id that existed before authentication
        if let Some(previous) =
            previous_token.and_then(|t| session_token::verify(&self.config.session_secret, t))
        {
            self.session_repo.delete(&previous).await?;
        }

        let session = self
            .config
            .session_ttl_chrono()
            .and_then(|ttl| Session::new(user.user_id, fingerprint, ttl))
            .ok_or_else(|| {
                AccountsError::Internal(format!(
                    "session TTL {:?} puts expiry out of range",
                    self.config.session_ttl
                ))
            })?;
        self.session_repo.create(&session).await?;

        let token = session_token::sign(&self.config.session_secret, &session.session_id)?;
        Ok((session, token))
    }
}
