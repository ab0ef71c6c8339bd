mod repository;

pub use repository::*;

/// SQL migration for users and accounts
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for the operation journal
pub const MIGRATION_002_JOURNAL: &str = include_str!("migrations/002_journal.sql");
