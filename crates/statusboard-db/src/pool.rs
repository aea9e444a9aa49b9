//! Pooled SQLite connections.

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{Connection, OpenFlags};
use std::time::Duration;
use thiserror::Error;

/// Connection tunables, normally taken from the `[database]` config section.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DbRuntimeSettings {
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
    pub pool_max_size: u32,
}

impl Default for DbRuntimeSettings {
    fn default() -> Self {
        Self {
            busy_timeout_ms: 5_000,
            pool_max_size: 8,
        }
    }
}

pub type DbPool = Pool<SqliteConnectionManager>;

#[derive(Debug, Error)]
pub enum PoolError {
    #[error("failed to create database connection pool: {0}")]
    PoolInit(#[from] r2d2::Error),
}

/// Runs on every new pooled connection.
///
/// File databases must end up in WAL mode so readers never block the single
/// writer; in-memory databases report `memory` and are accepted as is.
fn configure(conn: &mut Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    let mode: String = conn.query_row("PRAGMA journal_mode = WAL", [], |row| row.get(0))?;
    if !matches!(mode.as_str(), "wal" | "memory") {
        return Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(format!("journal_mode stayed '{mode}', expected 'wal'")),
        ));
    }
    conn.pragma_update(None, "synchronous", "NORMAL")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))
}

fn build(
    manager: SqliteConnectionManager,
    settings: DbRuntimeSettings,
) -> Result<DbPool, PoolError> {
    let timeout = settings.busy_timeout_ms;
    let manager = manager.with_init(move |conn| configure(conn, timeout));
    Ok(Pool::builder()
        .max_size(settings.pool_max_size)
        .build(manager)?)
}

/// Opens (creating if needed) the database file at `path`.
///
/// # Errors
///
/// `PoolError::PoolInit` when the first connection cannot be opened or
/// configured.
pub fn create_pool(path: &str, settings: DbRuntimeSettings) -> Result<DbPool, PoolError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let pool = build(
        SqliteConnectionManager::file(path).with_flags(flags),
        settings,
    )?;
    tracing::debug!(path, max_size = settings.pool_max_size, "opened database");
    Ok(pool)
}

/// A single-connection pool over a private in-memory database.
///
/// Each in-memory connection is its own database, so the pool is capped at
/// one connection to keep every caller on the same data.
pub fn create_memory_pool() -> Result<DbPool, PoolError> {
    build(
        SqliteConnectionManager::memory(),
        DbRuntimeSettings {
            pool_max_size: 1,
            ..DbRuntimeSettings::default()
        },
    )
}
