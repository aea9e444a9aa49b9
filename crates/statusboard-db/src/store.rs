//! Typed record storage.
//!
//! [`RecordStore`] is the capability contract the rest of the workspace
//! programs against: create, get, update, delete and ordered scans over any
//! [`Entity`]. [`SqliteStore`] implements it on top of one table per entity
//! family, each row holding the record as a JSON document under an
//! `AUTOINCREMENT` id, so ids are monotonic and never handed out twice.
//!
//! Every mutation runs in its own transaction when the connection is in
//! autocommit mode. When the connection is already inside a transaction
//! (see [`in_transaction`]) the store joins it instead, which lets callers
//! make several writes succeed or fail together.

use rusqlite::{params, Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use statusboard_types::{now, Timestamp};
use thiserror::Error;

/// Errors raised by record storage.
#[derive(Debug, Error)]
pub enum StoreError {
    /// An update was attempted on a record that was never stored.
    #[error("invalid {table} id: {id}")]
    InvalidId {
        /// Table the record belongs to.
        table: &'static str,
        /// The rejected id.
        id: i64,
    },

    /// A database operation failed.
    #[error("store database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// JSON serialization or deserialization failed.
    #[error("store serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// A record family persisted by a [`RecordStore`].
pub trait Entity: Serialize + DeserializeOwned {
    /// Table holding this family. Each family owns a disjoint table.
    const TABLE: &'static str;

    /// Sequence-assigned id, 0 before the first `create`.
    fn id(&self) -> i64;

    /// Called by the store when an id is assigned.
    fn set_id(&mut self, id: i64);

    /// Called by the store on every write.
    fn set_updated_at(&mut self, at: Timestamp);

    /// Optional unique lookup key (for example a service name).
    fn natural_key(&self) -> Option<String> {
        None
    }
}

/// Iteration order for [`RecordStore::scan`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanDirection {
    /// Lowest id first.
    Forward,
    /// Highest (newest) id first.
    Reverse,
}

impl ScanDirection {
    fn sql(self) -> &'static str {
        match self {
            Self::Forward => "ASC",
            Self::Reverse => "DESC",
        }
    }
}

/// Returned by scan visitors to keep going or stop early.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanControl {
    /// Hand the next record to the visitor.
    Continue,
    /// End the scan; no further records are read.
    Stop,
}

/// Keyed, sequence-identified record storage.
pub trait RecordStore {
    /// Assigns the next id, stamps `updated_at`, and persists the record.
    fn create<T: Entity>(&self, record: &mut T) -> Result<i64, StoreError>;

    /// Loads a record by id. A missing id is `Ok(None)`.
    fn get<T: Entity>(&self, id: i64) -> Result<Option<T>, StoreError>;

    /// Loads a record by its natural key. A missing key is `Ok(None)`.
    fn find_by_key<T: Entity>(&self, key: &str) -> Result<Option<T>, StoreError>;

    /// Overwrites the full record at its id and refreshes `updated_at`.
    ///
    /// Fails with [`StoreError::InvalidId`] when `id <= 0`.
    fn update<T: Entity>(&self, record: &mut T) -> Result<(), StoreError>;

    /// Removes a record. Deleting a missing id succeeds.
    fn delete<T: Entity>(&self, id: i64) -> Result<(), StoreError>;

    /// Visits records in id order until the visitor returns
    /// [`ScanControl::Stop`] or the table is exhausted.
    fn scan<T, F>(&self, direction: ScanDirection, visit: F) -> Result<(), StoreError>
    where
        T: Entity,
        F: FnMut(T) -> ScanControl;
}

/// [`RecordStore`] backed by a SQLite connection.
#[derive(Clone, Copy)]
pub struct SqliteStore<'c> {
    conn: &'c Connection,
}

impl<'c> SqliteStore<'c> {
    /// Wraps a connection. If the connection is inside a transaction,
    /// all writes join it.
    pub fn new(conn: &'c Connection) -> Self {
        Self { conn }
    }

    /// Runs `f` in a transaction of its own, or directly when the caller
    /// already holds one. A dropped transaction rolls back.
    fn write_scope<R>(
        &self,
        f: impl FnOnce(&Connection) -> Result<R, StoreError>,
    ) -> Result<R, StoreError> {
        if !self.conn.is_autocommit() {
            return f(self.conn);
        }
        let tx = self.conn.unchecked_transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }
}

fn decode<T: Entity>(id: i64, body: &str) -> Result<T, StoreError> {
    let mut record: T = serde_json::from_str(body)?;
    record.set_id(id);
    Ok(record)
}

impl RecordStore for SqliteStore<'_> {
    fn create<T: Entity>(&self, record: &mut T) -> Result<i64, StoreError> {
        self.write_scope(|conn| {
            let stamp = now();
            record.set_updated_at(stamp);

            // The id only exists once the row does, and the document embeds
            // it, so the body is written in a second statement.
            let id: i64 = conn.query_row(
                &format!(
                    "INSERT INTO {} (natural_key, body_json, updated_at)
                     VALUES (?1, '{{}}', ?2)
                     RETURNING id",
                    T::TABLE
                ),
                params![record.natural_key(), stamp.to_rfc3339()],
                |row| row.get(0),
            )?;
            record.set_id(id);

            let body = serde_json::to_string(&*record)?;
            conn.execute(
                &format!("UPDATE {} SET body_json = ?1 WHERE id = ?2", T::TABLE),
                params![body, id],
            )?;

            tracing::debug!(table = T::TABLE, id, "created record");
            Ok(id)
        })
    }

    fn get<T: Entity>(&self, id: i64) -> Result<Option<T>, StoreError> {
        let body: Option<String> = self
            .conn
            .query_row(
                &format!("SELECT body_json FROM {} WHERE id = ?1", T::TABLE),
                [id],
                |row| row.get(0),
            )
            .optional()?;

        body.map(|body| decode(id, &body)).transpose()
    }

    fn find_by_key<T: Entity>(&self, key: &str) -> Result<Option<T>, StoreError> {
        let row: Option<(i64, String)> = self
            .conn
            .query_row(
                &format!(
                    "SELECT id, body_json FROM {} WHERE natural_key = ?1",
                    T::TABLE
                ),
                [key],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;

        row.map(|(id, body)| decode(id, &body)).transpose()
    }

    fn update<T: Entity>(&self, record: &mut T) -> Result<(), StoreError> {
        let id = record.id();
        if id <= 0 {
            return Err(StoreError::InvalidId {
                table: T::TABLE,
                id,
            });
        }

        self.write_scope(|conn| {
            let stamp = now();
            record.set_updated_at(stamp);
            let body = serde_json::to_string(&*record)?;

            conn.execute(
                &format!(
                    "INSERT INTO {} (id, natural_key, body_json, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(id) DO UPDATE SET
                        natural_key = excluded.natural_key,
                        body_json = excluded.body_json,
                        updated_at = excluded.updated_at",
                    T::TABLE
                ),
                params![id, record.natural_key(), body, stamp.to_rfc3339()],
            )?;

            tracing::debug!(table = T::TABLE, id, "updated record");
            Ok(())
        })
    }

    fn delete<T: Entity>(&self, id: i64) -> Result<(), StoreError> {
        self.write_scope(|conn| {
            let removed = conn.execute(&format!("DELETE FROM {} WHERE id = ?1", T::TABLE), [id])?;
            tracing::debug!(table = T::TABLE, id, removed, "deleted record");
            Ok(())
        })
    }

    fn scan<T, F>(&self, direction: ScanDirection, mut visit: F) -> Result<(), StoreError>
    where
        T: Entity,
        F: FnMut(T) -> ScanControl,
    {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT id, body_json FROM {} ORDER BY id {}",
            T::TABLE,
            direction.sql()
        ))?;
        let mut rows = stmt.query([])?;

        while let Some(row) = rows.next()? {
            let id: i64 = row.get(0)?;
            let body: String = row.get(1)?;
            if visit(decode(id, &body)?) == ScanControl::Stop {
                break;
            }
        }

        Ok(())
    }
}

/// Runs `f` against a store whose writes all land in one transaction.
///
/// The transaction commits only if `f` returns `Ok`; any error (or a panic)
/// rolls back every write `f` made.
pub fn in_transaction<R, E>(
    conn: &mut Connection,
    f: impl FnOnce(&SqliteStore<'_>) -> Result<R, E>,
) -> Result<R, E>
where
    E: From<StoreError>,
{
    let tx = conn.transaction().map_err(StoreError::from)?;
    let out = f(&SqliteStore::new(&tx))?;
    tx.commit().map_err(StoreError::from)?;
    Ok(out)
}
