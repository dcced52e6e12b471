mod error;
mod location;
mod repository;

pub use error::*;
pub use location::*;
pub use repository::*;

/// SQL migration for initial schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");
