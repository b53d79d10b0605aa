//! Infrastructure Layer
//!
//! Repository implementations.

pub mod memory;
pub mod postgres;

pub use memory::MemoryAccountsRepository;
pub use postgres::PgAccountsRepository;
