use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::BaseDirs;
use rusqlite::{Connection, Transaction, TransactionBehavior};
use tracing::{debug, info};

use super::error::{Result, StoreError};

/// Folder name used beneath the user's home directory for application data.
const DATA_DIR_NAME: &str = ".user-registry";
/// Fixed database name; the file lives inside the data directory.
pub const DB_FILE_NAME: &str = "user-registry.sqlite";
/// Schema version this build creates and expects, tracked in `user_version`.
pub const SCHEMA_VERSION: i64 = 1;
/// The single table holding registrants.
pub const USERS_TABLE: &str = "users";
/// How long a statement waits on another connection's lock before the open
/// fails as busy.
pub const DEFAULT_BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// Resolve the absolute path to the SQLite database inside the user's home.
pub fn default_db_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new()?;
    Some(base_dirs.home_dir().join(DATA_DIR_NAME).join(DB_FILE_NAME))
}

/// Open (creating if absent) the database file at `path`, creating parent
/// directories as needed. Schema work happens in [`upgrade`].
pub(crate) fn open_file(path: &Path, busy_timeout: Duration) -> Result<Connection> {
    let location = path.display().to_string();

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|source| open_error(&location, source))?;
        }
    }

    let conn = Connection::open(path).map_err(|source| open_error(&location, source))?;
    conn.busy_timeout(busy_timeout)
        .map_err(|source| open_error(&location, source))?;
    Ok(conn)
}

pub(crate) fn open_memory() -> Result<Connection> {
    Connection::open_in_memory().map_err(|source| open_error(":memory:", source))
}

fn open_error<E>(location: &str, source: E) -> StoreError
where
    E: std::error::Error + Send + Sync + 'static,
{
    StoreError::Open {
        location: location.to_string(),
        source: Box::new(source),
    }
}

/// Outcome of a schema upgrade, reported once per version bump.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SchemaUpgrade {
    pub from: i64,
    pub to: i64,
}

/// Bring the schema to `requested`. A current database is left alone and
/// yields `None`; an older one gets the users table inside one transaction.
pub(crate) fn upgrade(
    conn: &Connection,
    location: &str,
    requested: i64,
) -> Result<Option<SchemaUpgrade>> {
    let open_err = |source: rusqlite::Error| open_error(location, source);

    let found = stored_version(conn).map_err(open_err)?;
    if found > requested {
        return Err(StoreError::VersionTooNew {
            found,
            supported: requested,
        });
    }
    if found == requested {
        debug!(version = found, "database schema is current");
        return Ok(None);
    }

    let tx = Transaction::new_unchecked(conn, TransactionBehavior::Immediate).map_err(open_err)?;
    tx.execute_batch(&format!(
        "CREATE TABLE IF NOT EXISTS {USERS_TABLE} (
            user_id INTEGER PRIMARY KEY,
            name TEXT NOT NULL,
            family TEXT NOT NULL,
            age TEXT NOT NULL,
            city TEXT NOT NULL,
            email TEXT NOT NULL,
            password TEXT NOT NULL
        )"
    ))
    .map_err(open_err)?;
    tx.pragma_update(None, "user_version", requested)
        .map_err(open_err)?;
    tx.commit().map_err(open_err)?;

    info!(from = found, to = requested, "database schema upgraded");
    Ok(Some(SchemaUpgrade {
        from: found,
        to: requested,
    }))
}

pub(crate) fn stored_version(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}
