//! Pooled connection bootstrap for SQLite.
//!
//! # Responsibility
//! - Open file or in-memory SQLite pools.
//! - Configure connection pragmas required by core behavior.
//! - Trigger schema migrations before returning a usable handle.
//!
//! # Invariants
//! - Every pooled connection has `foreign_keys=ON` and a busy timeout.
//! - File databases run in WAL mode so readers never block the writer.
//! - The in-memory pool holds exactly one connection that is never recycled.

use super::migrations::apply_migrations;
use super::DbResult;
use crate::config::DatabaseConfig;
use log::{error, info};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use std::path::Path;
use std::time::{Duration, Instant};

/// Connection checked out of the shared pool.
pub type PooledConnection = r2d2::PooledConnection<SqliteConnectionManager>;

/// Explicitly constructed database handle.
///
/// Cheap to clone; all clones share one pool.
#[derive(Clone)]
pub struct Database {
    pool: Pool<SqliteConnectionManager>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("max_size", &self.pool.max_size())
            .finish()
    }
}

impl Database {
    /// Opens the database described by `config`.
    ///
    /// A missing `path` selects the in-memory database.
    pub fn open(config: &DatabaseConfig) -> DbResult<Self> {
        let busy_timeout = Duration::from_millis(config.busy_timeout_ms);
        match config.path.as_ref() {
            Some(path) => Self::open_file(path, config.pool_max_size, busy_timeout),
            None => Self::open_in_memory(),
        }
    }

    /// Opens a pooled SQLite database file and applies all pending migrations.
    ///
    /// # Side effects
    /// - Emits `db_open` logging events with duration and status.
    pub fn open_file(
        path: impl AsRef<Path>,
        max_size: u32,
        busy_timeout: Duration,
    ) -> DbResult<Self> {
        let manager = SqliteConnectionManager::file(path)
            .with_init(move |conn| configure_connection(conn, busy_timeout, true));
        let builder = Pool::builder().max_size(max_size);
        Self::build(builder, manager, "file")
    }

    /// Opens an in-memory database behind a single-connection pool.
    pub fn open_in_memory() -> DbResult<Self> {
        let manager = SqliteConnectionManager::memory()
            .with_init(|conn| configure_connection(conn, Duration::from_secs(5), false));
        // Recycling the only connection would drop the whole database.
        let builder = Pool::builder()
            .max_size(1)
            .idle_timeout(None)
            .max_lifetime(None);
        Self::build(builder, manager, "memory")
    }

    /// Checks one connection out of the pool.
    pub fn connection(&self) -> DbResult<PooledConnection> {
        Ok(self.pool.get()?)
    }

    fn build(
        builder: r2d2::Builder<SqliteConnectionManager>,
        manager: SqliteConnectionManager,
        mode: &'static str,
    ) -> DbResult<Self> {
        let started_at = Instant::now();
        info!("event=db_open module=db status=start mode={mode}");

        match build_migrated_pool(builder, manager) {
            Ok(pool) => {
                info!(
                    "event=db_open module=db status=ok mode={mode} pool_size={} duration_ms={}",
                    pool.max_size(),
                    started_at.elapsed().as_millis()
                );
                Ok(Self { pool })
            }
            Err(err) => {
                error!(
                    "event=db_open module=db status=error mode={mode} duration_ms={} error_code=db_bootstrap_failed error={}",
                    started_at.elapsed().as_millis(),
                    err
                );
                Err(err)
            }
        }
    }
}

/// Starts a write transaction that takes the database write lock up front.
///
/// Concurrent writers queue on the busy timeout instead of failing on lock
/// upgrade; the transaction rolls back when dropped without commit.
pub fn begin_write(conn: &mut Connection) -> rusqlite::Result<Transaction<'_>> {
    conn.transaction_with_behavior(TransactionBehavior::Immediate)
}

fn build_migrated_pool(
    builder: r2d2::Builder<SqliteConnectionManager>,
    manager: SqliteConnectionManager,
) -> DbResult<Pool<SqliteConnectionManager>> {
    let pool = builder.build(manager)?;
    {
        let mut conn = pool.get()?;
        apply_migrations(&mut conn)?;
    }
    Ok(pool)
}

fn configure_connection(
    conn: &mut Connection,
    busy_timeout: Duration,
    wal: bool,
) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    if wal {
        let _mode: String = conn.query_row("PRAGMA journal_mode = WAL;", [], |row| row.get(0))?;
    }
    Ok(())
}
