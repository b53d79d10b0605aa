//! Accounts Error Types
//!
//! Accounts-specific error variants that integrate with the unified
//! `kernel::error::AppError` system.

use axum::http::{HeaderValue, Method, header};
use axum::response::{IntoResponse, Response};
use kernel::error::app_error::{AppError, FieldErrors};
use kernel::error::kind::ErrorKind;
use thiserror::Error;

pub type AccountsResult<T> = Result<T, AccountsError>;

/// Summary message sent alongside per-field validation errors
pub const CHECK_INPUT_MESSAGE: &str = "Please check input";

#[derive(Debug, Error)]
pub enum AccountsError {
    /// One or more input fields failed validation
    #[error("Please check input")]
    Validation(FieldErrors),

    /// Wrong password, or the account cannot log in
    #[error("Username and password does not match.")]
    InvalidCredentials,

    /// Request body could not be parsed
    #[error("Malformed request body: {0}")]
    MalformedBody(String),

    #[error("Method \"{method}\" not allowed.")]
    MethodNotAllowed {
        method: Method,
        allowed: &'static str,
    },

    /// A unique value was inserted twice (lost a race with another request)
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AccountsError {
    /// Single-field validation failure
    pub fn field(field: &str, message: impl Into<String>) -> Self {
        let mut errors = FieldErrors::new();
        errors.insert(field.to_string(), vec![message.into()]);
        AccountsError::Validation(errors)
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            AccountsError::Validation(_)
            | AccountsError::InvalidCredentials
            | AccountsError::MalformedBody(_) => ErrorKind::BadRequest,
            AccountsError::MethodNotAllowed { .. } => ErrorKind::MethodNotAllowed,
            AccountsError::Duplicate(_) => ErrorKind::Conflict,
            AccountsError::Database(_) | AccountsError::Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn into_app_error(self) -> AppError {
        match self {
            AccountsError::Validation(errors) => {
                AppError::bad_request(CHECK_INPUT_MESSAGE).with_field_errors(errors)
            }
            // Keep sqlx's own classification (duplicate key -> 409, pool -> 503)
            AccountsError::Database(e) => AppError::from(e),
            // Internal details stay in the logs
            AccountsError::Internal(_) => AppError::internal("Internal server error"),
            other => AppError::new(other.kind(), other.to_string()),
        }
    }

    fn log(&self) {
        match self {
            AccountsError::Database(e) => {
                tracing::error!(error = %e, "Accounts database error");
            }
            AccountsError::Internal(msg) => {
                tracing::error!(message = %msg, "Accounts internal error");
            }
            AccountsError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            _ => {
                tracing::debug!(error = %self, "Accounts request rejected");
            }
        }
    }
}

impl IntoResponse for AccountsError {
    fn into_response(self) -> Response {
        self.log();

        let allow = match &self {
            AccountsError::MethodNotAllowed { allowed, .. } => Some(*allowed),
            _ => None,
        };

        let mut response = self.into_app_error().into_response();
        if let Some(allowed) = allow {
            response
                .headers_mut()
                .insert(header::ALLOW, HeaderValue::from_static(allowed));
        }
        response
    }
}
