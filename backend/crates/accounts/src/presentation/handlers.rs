//! HTTP Handlers

use axum::Json;
use axum::extract::State;
use axum::http::{Method, StatusCode, header};
use axum::response::IntoResponse;
use std::sync::Arc;

use crate::application::config::AccountsConfig;
use crate::application::{CheckSessionUseCase, SignInUseCase, SignOutUseCase, SignUpUseCase};
use crate::domain::repository::AccountsRepository;
use crate::error::{AccountsError, AccountsResult};
use crate::presentation::dto::{
    AuthResponse, LoginRequest, LoginStatusResponse, LogoutResponse, SignUpRequest, UserResponse,
};
use crate::presentation::extract::{ClientContext, Payload};

/// Shared state for accounts handlers
#[derive(Clone)]
pub struct AccountsAppState<R>
where
    R: AccountsRepository,
{
    pub repo: Arc<R>,
    pub config: Arc<AccountsConfig>,
}

// ============================================================================
// Sign Up
// ============================================================================

/// POST /api/accounts/signup/
pub async fn sign_up<R>(
    State(state): State<AccountsAppState<R>>,
    client: ClientContext,
    Payload(req): Payload<SignUpRequest>,
) -> AccountsResult<impl IntoResponse>
where
    R: AccountsRepository,
{
    let use_case = SignUpUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(
            req.into(),
            &client.fingerprint,
            client.session_token.as_deref(),
        )
        .await?;

    let cookie = state
        .config
        .cookie_config()
        .build_set_cookie(&output.session_token);

    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(&output.user)),
    ))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/accounts/login/
pub async fn login<R>(
    State(state): State<AccountsAppState<R>>,
    client: ClientContext,
    Payload(req): Payload<LoginRequest>,
) -> AccountsResult<impl IntoResponse>
where
    R: AccountsRepository,
{
    let use_case = SignInUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let output = use_case
        .execute(
            req.into(),
            &client.fingerprint,
            client.session_token.as_deref(),
        )
        .await?;

    let cookie = state
        .config
        .cookie_config()
        .build_set_cookie(&output.session_token);

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(AuthResponse::from(&output.user)),
    ))
}

// ============================================================================
// Logout
// ============================================================================

/// POST /api/accounts/logout/
pub async fn logout<R>(
    State(state): State<AccountsAppState<R>>,
    client: ClientContext,
) -> impl IntoResponse
where
    R: AccountsRepository,
{
    let use_case = SignOutUseCase::new(state.repo.clone(), state.config.clone());

    // Ignore errors - the cookie is cleared either way
    if let Err(e) = use_case.execute(client.session_token.as_deref()).await {
        tracing::warn!(error = %e, "Failed to delete session on logout");
    }

    (
        StatusCode::OK,
        [(
            header::SET_COOKIE,
            state.config.cookie_config().build_delete_cookie(),
        )],
        Json(LogoutResponse { success: true }),
    )
}

// ============================================================================
// Login Status
// ============================================================================

/// GET /api/accounts/login_status/
pub async fn login_status<R>(
    State(state): State<AccountsAppState<R>>,
    client: ClientContext,
) -> AccountsResult<Json<LoginStatusResponse>>
where
    R: AccountsRepository,
{
    let use_case =
        CheckSessionUseCase::new(state.repo.clone(), state.repo.clone(), state.config.clone());

    let user = use_case
        .execute(client.session_token.as_deref(), &client.fingerprint)
        .await?;

    Ok(Json(LoginStatusResponse {
        has_logged_in: user.is_some(),
        ip: client.fingerprint.ip_string(),
        user: user.as_ref().map(UserResponse::from),
    }))
}

// ============================================================================
// Method fallbacks
// ============================================================================

pub async fn post_only(method: Method) -> AccountsError {
    AccountsError::MethodNotAllowed {
        method,
        allowed: "POST",
    }
}

pub async fn get_only(method: Method) -> AccountsError {
    AccountsError::MethodNotAllowed {
        method,
        allowed: "GET, HEAD",
    }
}
