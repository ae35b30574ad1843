mod memory;
mod postgres;
mod store;

pub use memory::*;
pub use postgres::*;
pub use store::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
