//! Versioned schema migrations, compiled into the binary.
//!
//! The highest applied version is kept in `_statusboard_migrations`; on
//! start-up every embedded migration above it is applied in order, each in
//! its own transaction together with its tracking row.

use rusqlite::Connection;
use thiserror::Error;

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

macro_rules! migration {
    ($version:literal, $name:literal) => {
        Migration {
            version: $version,
            name: $name,
            sql: include_str!(concat!("migrations/", $name, ".sql")),
        }
    };
}

/// Append only; versions must increase.
const MIGRATIONS: &[Migration] = &[
    migration!(1, "001_incidents"),
    migration!(2, "002_scheduled_maintenance"),
    migration!(3, "003_services"),
    migration!(4, "004_regions"),
    migration!(5, "005_region_keys"),
];

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("migration {version} ({name}) failed: {source}")]
    ExecutionFailed {
        version: u32,
        name: &'static str,
        source: rusqlite::Error,
    },

    #[error("failed to read schema version: {0}")]
    StateQuery(rusqlite::Error),
}

/// Brings the schema up to date and returns how many migrations ran.
///
/// # Errors
///
/// Stops at the first failing migration; earlier ones stay applied.
pub fn run_migrations(conn: &Connection) -> Result<usize, MigrationError> {
    apply(conn, MIGRATIONS)
}

/// The highest applied schema version, `None` on a fresh database.
pub fn schema_version(conn: &Connection) -> Result<Option<u32>, MigrationError> {
    ensure_tracking_table(conn)?;
    conn.query_row(
        "SELECT MAX(version) FROM _statusboard_migrations",
        [],
        |row| row.get(0),
    )
    .map_err(MigrationError::StateQuery)
}

fn ensure_tracking_table(conn: &Connection) -> Result<(), MigrationError> {
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS _statusboard_migrations (
            version INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )
    .map_err(MigrationError::StateQuery)
}

fn apply(conn: &Connection, migrations: &[Migration]) -> Result<usize, MigrationError> {
    let current = schema_version(conn)?;
    let pending = migrations
        .iter()
        .filter(|m| current.is_none_or(|v| m.version > v));

    let mut applied = 0;
    for migration in pending {
        let failed = |source| MigrationError::ExecutionFailed {
            version: migration.version,
            name: migration.name,
            source,
        };

        let tx = conn.unchecked_transaction().map_err(failed)?;
        tx.execute_batch(migration.sql).map_err(failed)?;
        tx.execute(
            "INSERT INTO _statusboard_migrations (version, name) VALUES (?1, ?2)",
            rusqlite::params![migration.version, migration.name],
        )
        .map_err(failed)?;
        tx.commit().map_err(failed)?;

        tracing::info!(
            version = migration.version,
            migration = migration.name,
            "applied migration"
        );
        applied += 1;
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table_exists(conn: &Connection, table: &str) -> bool {
        conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = ?1)",
            [table],
            |row| row.get(0),
        )
        .expect("should query sqlite_master")
    }

    #[test]
    fn fresh_database_gets_every_table() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        assert_eq!(schema_version(&conn).unwrap(), None);

        let applied = run_migrations(&conn).expect("migrations should succeed");

        assert_eq!(applied, MIGRATIONS.len());
        assert_eq!(schema_version(&conn).unwrap(), Some(5));
        for table in ["incidents", "scheduled_maintenance", "services", "regions"] {
            assert!(table_exists(&conn, table), "{table} table should exist");
        }
    }

    #[test]
    fn second_run_is_a_no_op() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        run_migrations(&conn).expect("first run");
        assert_eq!(run_migrations(&conn).expect("second run"), 0);
    }

    #[test]
    fn only_newer_versions_are_applied() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply(&conn, &MIGRATIONS[..2]).expect("partial schema");
        assert_eq!(schema_version(&conn).unwrap(), Some(2));

        let applied = run_migrations(&conn).expect("catch up");

        assert_eq!(applied, 3);
        assert!(table_exists(&conn, "regions"));
    }

    #[test]
    fn region_keys_are_rewritten_with_length_prefix() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        apply(&conn, &MIGRATIONS[..4]).expect("schema before key rewrite");
        conn.execute(
            "INSERT INTO regions (natural_key, body_json, updated_at) VALUES (?1, ?2, 'now')",
            [
                "só/eu-1",
                r#"{"service_name":"só","code":"eu-1"}"#,
            ],
        )
        .unwrap();

        run_migrations(&conn).expect("catch up");

        let key: String = conn
            .query_row("SELECT natural_key FROM regions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(key, crate::region_key("só", "eu-1"));
    }

    #[test]
    fn failed_migration_leaves_nothing_behind() {
        let conn = Connection::open_in_memory().expect("open in-memory db");
        let broken = [Migration {
            version: 7,
            name: "007_broken",
            sql: "CREATE TABLE half_done (id INTEGER PRIMARY KEY); INSERT INTO nowhere VALUES (1);",
        }];

        let err = apply(&conn, &broken).expect_err("broken migration should fail");

        assert!(matches!(
            err,
            MigrationError::ExecutionFailed { version: 7, .. }
        ));
        assert!(!table_exists(&conn, "half_done"));
        assert_eq!(schema_version(&conn).unwrap(), None);
    }
}
