//! Sign In Use Case
//!
//! Authenticates a user and creates a session.

use std::sync::Arc;

use platform::client::ClientFingerprint;

use crate::application::config::AccountsConfig;
use crate::application::fields::FieldCollector;
use crate::application::session::EstablishSession;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AccountsError, AccountsResult};

pub const USER_NOT_FOUND_MESSAGE: &str = "User does not exist.";

#[derive(Debug, Default)]
pub struct SignInInput {
    pub username: Option<String>,
    pub password: Option<String>,
}

pub struct SignInOutput {
    pub user: User,
    /// Session token for cookie
    pub session_token: String,
}

pub struct SignInUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session: EstablishSession<S>,
    config: Arc<AccountsConfig>,
}

impl<U, S> SignInUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    pub fn new(user_repo: Arc<U>, session_repo: Arc<S>, config: Arc<AccountsConfig>) -> Self {
        Self {
            user_repo,
            session: EstablishSession::new(session_repo, config.clone()),
            config,
        }
    }

    pub async fn execute(
        &self,
        input: SignInInput,
        fingerprint: &ClientFingerprint,
        previous_token: Option<&str>,
    ) -> AccountsResult<SignInOutput> {
        let mut fields = FieldCollector::new();
        let user_name = fields.non_blank("username", input.username);
        let password = fields.non_blank("password", input.password);
        fields.finish()?;

        let (Some(user_name), Some(password)) = (user_name, password) else {
            return Err(AccountsError::Internal("validated login field missing".into()));
        };

        let user_name = UserName::lookup_key(user_name);
        let Some(mut user) = self.user_repo.find_by_user_name(&user_name).await? else {
            tracing::debug!(user_name = %user_name, "Login for unknown user");
            return Err(AccountsError::field("username", USER_NOT_FOUND_MESSAGE));
        };

        let raw_password = RawPassword::for_login(password);
        if !user.password.verify(&raw_password, self.config.pepper()) || !user.can_login() {
            tracing::warn!(user_id = %user.user_id, "Login rejected");
            return Err(AccountsError::InvalidCredentials);
        }

        // Upgrade hashes created with older Argon2 parameters
        if user.password.needs_rehash() {
            user.set_password(UserPassword::from_raw(&raw_password, self.config.pepper())?);
        }

        user.record_login();
        self.user_repo.update(&user).await?;

        let (session, session_token) = self
            .session
            .execute(&user, fingerprint, previous_token)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            session_id = %session.session_id,
            "User signed in"
        );

        Ok(SignInOutput { user, session_token })
    }
}
