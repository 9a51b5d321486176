//! SQLite storage bootstrap, pooling and schema migration entry points.
//!
//! # Responsibility
//! - Build the pooled connection handle shared by every repository.
//! - Apply schema migrations in deterministic order.
//! - Provide the positional-parameter builder used by multi-row statements.
//!
//! # Invariants
//! - Migration version is tracked via `PRAGMA user_version`.
//! - No repository reads or writes before migrations succeed.
//! - The pool is constructed explicitly and injected; there is no global handle.

use thiserror::Error;

pub mod migrations;
mod open;
mod statement;

pub use open::{begin_write, Database, PooledConnection};
pub use statement::StatementParams;

/// Expression producing the current time in epoch milliseconds.
pub(crate) const NOW_MS_SQL: &str = "CAST(unixepoch('subsec') * 1000 AS INTEGER)";

pub type DbResult<T> = Result<T, DbError>;

/// Bootstrap-level storage failure.
///
/// These never cross the service boundary as-is: the error translator
/// reduces them to an internal outcome.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("{0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),
    #[error("database schema version {db_version} is newer than supported {latest_supported}")]
    UnsupportedSchemaVersion {
        db_version: u32,
        latest_supported: u32,
    },
}
