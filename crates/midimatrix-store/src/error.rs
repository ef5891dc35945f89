use midimatrix_shared::{UserId, ValidationError};
use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A required field is empty or a length bound was exceeded.
    #[error("Invalid record: {0}")]
    Validation(#[from] ValidationError),

    /// The user already has a profile.
    #[error("User {0} already has a profile")]
    DuplicateProfile(UserId),

    /// A record referenced a user the store has never seen.
    #[error("Unknown user {0}")]
    UnknownUser(UserId),

    /// The user cannot be removed while records still point at it.
    #[error("User {user} is still referenced by {profiles} profile(s) and {matrices} matrix record(s)")]
    UserHasDependents {
        user: UserId,
        profiles: usize,
        matrices: usize,
    },

    /// Backup (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Map `QueryReturnedNoRows` to [`StoreError::NotFound`].
pub(crate) fn not_found(e: rusqlite::Error) -> StoreError {
    match e {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}

/// Extended result code of a SQLite constraint failure, e.g.
/// `ffi::SQLITE_CONSTRAINT_UNIQUE`. `None` for any other error.
pub(crate) fn constraint_kind(e: &rusqlite::Error) -> Option<std::os::raw::c_int> {
    match e {
        rusqlite::Error::SqliteFailure(err, _)
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            Some(err.extended_code)
        }
        _ => None,
    }
}
