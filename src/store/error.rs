//! Error types for the record store.

use thiserror::Error;

use crate::models::UserId;

/// Failures surfaced by [`RecordStore`](super::RecordStore) operations.
#[derive(Error, Debug)]
pub enum StoreError {
    /// The database could not be opened or brought to the current schema:
    /// the data directory cannot be created, permissions are missing, another
    /// connection holds the lock, or the file is corrupt.
    #[error("failed to open user database at {location}: {source}")]
    Open {
        location: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// The file was written by a newer schema than this build understands.
    #[error("database schema version {found} is newer than supported version {supported}")]
    VersionTooNew { found: i64, supported: i64 },

    /// An insert hit an existing primary key. The stored record is untouched.
    #[error("User id {0} already exists.")]
    DuplicateKey(UserId),

    /// The sequential policy found `i64::MAX` in use and has no id left.
    #[error("no user id is left after {0}.")]
    IdsExhausted(UserId),

    /// Any other SQLite failure inside a transaction.
    #[error("transaction failed: {0}")]
    Transaction(#[from] rusqlite::Error),
}

/// A type alias for Results with our Error type
pub type Result<T> = std::result::Result<T, StoreError>;
