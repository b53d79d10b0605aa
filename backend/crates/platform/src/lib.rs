//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no knowledge of accounts:
//! - Password policy and Argon2id hashing
//! - Cookie building and parsing
//! - Client identification (IP, User-Agent fingerprint)
//! - Small cryptographic helpers

pub mod client;
pub mod cookie;
pub mod crypto;
pub mod password;
