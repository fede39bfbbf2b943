//! Persistence layer: one SQLite table of registrants behind [`RecordStore`].
//!
//! Every public operation runs inside exactly one transaction that commits
//! when the operation succeeds and rolls back when it fails. Calls return only
//! after the transaction finished, so operations are observed in call order.

mod connection;
mod error;
mod users;

use std::path::Path;
use std::time::Duration;

use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use crate::models::{UserId, UserRecord};

pub use connection::{
    default_db_path, SchemaUpgrade, DB_FILE_NAME, DEFAULT_BUSY_TIMEOUT, SCHEMA_VERSION,
    USERS_TABLE,
};
pub use error::{Result, StoreError};

/// Owner of the database handle. Opened once at startup and passed by
/// reference afterwards.
#[derive(Debug)]
pub struct RecordStore {
    conn: Connection,
    location: String,
    upgrade: Option<SchemaUpgrade>,
}

impl RecordStore {
    /// Open the database at `path` at [`SCHEMA_VERSION`], creating the file
    /// and the users table when missing.
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with_busy_timeout(path, DEFAULT_BUSY_TIMEOUT)
    }

    /// Like [`RecordStore::open`], giving up on a database locked by another
    /// connection after `busy_timeout`.
    pub fn open_with_busy_timeout(path: &Path, busy_timeout: Duration) -> Result<Self> {
        let conn = connection::open_file(path, busy_timeout)?;
        Self::init(conn, path.display().to_string(), SCHEMA_VERSION)
    }

    /// Private in-memory database. Used by tests.
    pub fn open_in_memory() -> Result<Self> {
        let conn = connection::open_memory()?;
        Self::init(conn, ":memory:".to_string(), SCHEMA_VERSION)
    }

    /// Open `path` requesting an explicit schema version.
    pub fn open_with_version(path: &Path, version: i64) -> Result<Self> {
        let conn = connection::open_file(path, DEFAULT_BUSY_TIMEOUT)?;
        Self::init(conn, path.display().to_string(), version)
    }

    fn init(conn: Connection, location: String, version: i64) -> Result<Self> {
        let upgrade = connection::upgrade(&conn, &location, version)?;
        info!(%location, version, "opened user database");
        Ok(Self {
            conn,
            location,
            upgrade,
        })
    }

    /// Where the database lives, for status lines and logs.
    pub fn location(&self) -> &str {
        &self.location
    }

    /// The upgrade performed while opening, if any.
    pub fn upgrade(&self) -> Option<SchemaUpgrade> {
        self.upgrade
    }

    pub fn schema_version(&self) -> Result<i64> {
        Ok(connection::stored_version(&self.conn)?)
    }

    /// Insert a new record. A record with the same id is a
    /// [`StoreError::DuplicateKey`] and leaves the stored one untouched.
    pub fn create(&self, record: &UserRecord) -> Result<()> {
        self.write(|tx| users::insert_user(tx, record))?;
        info!(user_id = record.user_id, "created user");
        Ok(())
    }

    /// Every record, ascending by id.
    pub fn list_all(&self) -> Result<Vec<UserRecord>> {
        self.read(|tx| users::fetch_users(tx))
    }

    /// Point lookup. An unknown id is `Ok(None)`, not an error.
    pub fn get_one(&self, user_id: UserId) -> Result<Option<UserRecord>> {
        self.read(|tx| users::fetch_user(tx, user_id))
    }

    /// Full replace of the record at `record.user_id`, inserting it when
    /// absent.
    pub fn update(&self, record: &UserRecord) -> Result<()> {
        self.write(|tx| users::put_user(tx, record))?;
        info!(user_id = record.user_id, "updated user");
        Ok(())
    }

    /// Remove a record. Returns `false` when the id was not stored.
    pub fn delete(&self, user_id: UserId) -> Result<bool> {
        let removed = self.write(|tx| users::delete_user(tx, user_id))?;
        if removed {
            info!(user_id, "deleted user");
        } else {
            debug!(user_id, "delete skipped, user not found");
        }
        Ok(removed)
    }

    /// Highest stored id, `None` for an empty table.
    pub fn max_id(&self) -> Result<Option<UserId>> {
        self.read(|tx| users::max_user_id(tx))
    }

    /// Release the handle. Dropping the store closes it as well; this variant
    /// reports a failing close.
    pub fn close(self) -> Result<()> {
        let location = self.location;
        self.conn.close().map_err(|(_, err)| {
            debug!(%location, "closing user database failed");
            StoreError::Transaction(err)
        })?;
        info!(%location, "closed user database");
        Ok(())
    }

    fn read<T>(&self, op: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_transaction(TransactionBehavior::Deferred, op)
    }

    fn write<T>(&self, op: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
        self.with_transaction(TransactionBehavior::Immediate, op)
    }

    /// Run `op` in a fresh transaction. Dropping the transaction on the error
    /// path rolls it back.
    fn with_transaction<T>(
        &self,
        behavior: TransactionBehavior,
        op: impl FnOnce(&Transaction<'_>) -> Result<T>,
    ) -> Result<T> {
        let tx = Transaction::new_unchecked(&self.conn, behavior)?;
        let value = op(&tx)?;
        tx.commit()?;
        Ok(value)
    }
}
