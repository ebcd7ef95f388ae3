// ABOUTME: Storage error types for the Taskboard data layer
// ABOUTME: Wraps sqlx, IO, and migration failures behind one enum

use thiserror::Error;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
    #[error("Sqlx error: {0}")]
    Sqlx(#[from] sqlx::Error),
    #[error("Database error: {0}")]
    Database(String),
}

pub type StorageResult<T> = Result<T, StorageError>;

// SQLite primary result codes for busy/locked handlers.
const SQLITE_BUSY: &str = "5";
const SQLITE_LOCKED: &str = "6";

impl StorageError {
    /// Whether this error is a SQLite busy/locked condition, i.e. a
    /// concurrent writer held the database and the operation may be retried.
    pub fn is_busy(&self) -> bool {
        match self {
            StorageError::Sqlx(sqlx::Error::Database(db)) => {
                match db.code().as_deref() {
                    Some(SQLITE_BUSY) | Some(SQLITE_LOCKED) => true,
                    // Extended codes such as SQLITE_BUSY_SNAPSHOT (517)
                    _ => db.message().contains("database is locked"),
                }
            }
            _ => false,
        }
    }
}
