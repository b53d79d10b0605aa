//! Accounts Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits
//! - `application/` - Use cases and application services
//! - `infra/` - PostgreSQL and in-memory repositories
//! - `presentation/` - HTTP handlers, DTOs, extractors, router
//!
//! ## Endpoints (mounted under `/api/accounts`)
//! - `POST /signup/` - create an account and log it in
//! - `POST /login/` - log in with username + password
//! - `POST /logout/` - drop the current session
//! - `GET /login_status/` - report whether the caller is logged in
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, optional pepper
//! - Server-side sessions referenced by an HMAC-signed `sessionid` cookie
//! - Sessions bound to client fingerprint (User-Agent) and rotated on login

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AccountsConfig;
pub use domain::repository::{AccountsRepository, SessionRepository, UserRepository};
pub use error::{AccountsError, AccountsResult};
pub use infra::{MemoryAccountsRepository, PgAccountsRepository};
pub use presentation::router::accounts_router;

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};
