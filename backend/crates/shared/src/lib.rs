//! Shared Kernel - Domain-crossing minimal core
//!
//! Vocabulary every crate in the workspace agrees on:
//! - Error classification, the unified error type and its conversions
//! - Typed identifiers
//!
//! Nothing here knows about accounts, sessions or HTTP routes.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
