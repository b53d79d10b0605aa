//! Presentation Layer
//!
//! HTTP handlers, DTOs, extractors, and router.

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod router;

pub use handlers::AccountsAppState;
pub use router::accounts_router;
