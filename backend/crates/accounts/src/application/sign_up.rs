//! Sign Up Use Case
//!
//! Creates a new account and logs it in.

use std::sync::Arc;

use platform::client::ClientFingerprint;

use crate::application::config::AccountsConfig;
use crate::application::fields::FieldCollector;
use crate::application::session::EstablishSession;
use crate::domain::entity::user::User;
use crate::domain::repository::{SessionRepository, UserRepository};
use crate::domain::value_object::{
    email::Email,
    user_name::UserName,
    user_password::{RawPassword, UserPassword},
};
use crate::error::{AccountsError, AccountsResult};

pub const USERNAME_TAKEN_MESSAGE: &str = "This username has been occupied.";
pub const EMAIL_TAKEN_MESSAGE: &str = "This email address has been occupied.";

/// Sign up input (absent fields are reported, not defaulted)
#[derive(Debug, Default)]
pub struct SignUpInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

pub struct SignUpOutput {
    pub user: User,
    /// Session token for cookie
    pub session_token: String,
}

pub struct SignUpUseCase<U, S>
where
    U: UserRepository,
    S: SessionRepository,
{
    user_repo: Arc<U>,
    session: EstablishSession<S>,
    config: Arc<AccountsConfig>,
}

impl<U, S> SignUpUseCase<U, S>
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
        input: SignUpInput,
        fingerprint: &ClientFingerprint,
        previous_token: Option<&str>,
    ) -> AccountsResult<SignUpOutput> {
        let mut fields = FieldCollector::new();

        let user_name = fields.parse("username", input.username, UserName::new);
        let email = fields.parse("email", input.email, Email::new);
        let raw_password = fields.parse("password", input.password, RawPassword::new);

        if let Some(user_name) = &user_name {
            if self.user_repo.exists_by_user_name(user_name).await? {
                fields.add("username", USERNAME_TAKEN_MESSAGE);
            }
        }

        if let Some(email) = &email {
            if self.user_repo.exists_by_email(email).await? {
                fields.add("email", EMAIL_TAKEN_MESSAGE);
            }
        }

        fields.finish()?;

        // A missing value always records a field error, so these are all set
        let (Some(user_name), Some(email), Some(raw_password)) = (user_name, email, raw_password)
        else {
            return Err(AccountsError::Internal("validated signup field missing".into()));
        };

        let password = UserPassword::from_raw(&raw_password, self.config.pepper())?;

        let mut user = User::new(user_name, email, password);
        user.record_login();
        self.user_repo.create(&user).await?;

        let (session, session_token) = self
            .session
            .execute(&user, fingerprint, previous_token)
            .await?;

        tracing::info!(
            user_id = %user.user_id,
            user_name = %user.user_name,
            session_id = %session.session_id,
            "User signed up"
        );

        Ok(SignUpOutput { user, session_token })
    }
}
