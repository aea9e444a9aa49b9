//! Database layer for statusboard.
//!
//! Provides SQLite connection pooling (via `r2d2`), WAL-mode initialization,
//! embedded SQL migrations, and the typed record store every other crate
//! persists through.
//!
//! # Design decisions
//!
//! - **SQLite with WAL mode**: one embedded file, no external database
//!   process. WAL allows concurrent readers with a single writer, which is
//!   exactly the status service's access pattern.
//! - **Documents, not columns**: each record is stored whole as JSON next to
//!   its integer id. The record shapes live in `statusboard-types` and can
//!   grow fields without a migration.
//! - **Embedded migrations**: SQL files are compiled into the binary via
//!   `include_str!`, so the schema ships with the code that depends on it.

mod entities;
mod migrations;
mod pool;
mod store;

pub use entities::region_key;
pub use migrations::{run_migrations, schema_version, MigrationError};
pub use pool::{create_memory_pool, create_pool, DbPool, DbRuntimeSettings, PoolError};
pub use store::{
    in_transaction, Entity, RecordStore, ScanControl, ScanDirection, SqliteStore, StoreError,
};
