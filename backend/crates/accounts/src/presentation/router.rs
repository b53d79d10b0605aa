//! Accounts Router
//!
//! Paths keep their trailing slash; mount under `/api/accounts`.

use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::application::config::AccountsConfig;
use crate::domain::repository::AccountsRepository;
use crate::presentation::handlers::{self, AccountsAppState};

/// Create the accounts router for any repository implementation
pub fn accounts_router<R>(repo: R, config: AccountsConfig) -> Router
where
    R: AccountsRepository,
{
    let state = AccountsAppState {
        repo: Arc::new(repo),
        config: Arc::new(config),
    };

    Router::new()
        .route(
            "/signup/",
            post(handlers::sign_up::<R>).fallback(handlers::post_only),
        )
        .route(
            "/login/",
            post(handlers::login::<R>).fallback(handlers::post_only),
        )
        .route(
            "/logout/",
            post(handlers::logout::<R>).fallback(handlers::post_only),
        )
        .route(
            "/login_status/",
            get(handlers::login_status::<R>).fallback(handlers::get_only),
        )
        .with_state(state)
}
