// ABOUTME: Database connection management and schema migration
// ABOUTME: Bootstraps the SQLite pool with WAL and foreign-key enforcement

use std::path::PathBuf;
use std::time::Duration;

use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous,
};
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::StorageError;

/// Connect to the board database, creating it and running migrations.
///
/// Defaults to `~/.taskboard/board.db` when no path is given.
pub async fn connect(database_path: Option<PathBuf>) -> Result<SqlitePool, StorageError> {
    let database_path = database_path.unwrap_or_else(taskboard_core::constants::board_db_file);

    // Ensure parent directory exists
    if let Some(parent) = database_path.parent() {
        std::fs::create_dir_all(parent).map_err(StorageError::Io)?;
    }

    debug!("Connecting to database: {}", database_path.display());

    // foreign_keys is per-connection; the connect options apply it to every
    // connection the pool opens.
    let options = SqliteConnectOptions::new()
        .filename(&database_path)
        .create_if_missing(true)
        .journal_mode(SqliteJournalMode::Wal)
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true)
        .busy_timeout(Duration::from_secs(5));

    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(30))
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    info!("Database connection established");

    migrate(&pool).await?;

    Ok(pool)
}

/// Connect to a fresh in-memory database with the schema applied.
///
/// The pool is capped at one connection: every handle to a `:memory:`
/// database must be the same connection or each would see its own empty
/// database.
pub async fn connect_in_memory() -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::new()
        .filename(":memory:")
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect_with(options)
        .await
        .map_err(StorageError::Sqlx)?;

    migrate(&pool).await?;

    Ok(pool)
}

/// Run pending migrations against the pool
pub async fn migrate(pool: &SqlitePool) -> Result<(), StorageError> {
    sqlx::migrate!("./migrations")
        .run(pool)
        .await
        .map_err(StorageError::Migration)?;

    debug!("Database migrations completed");
    Ok(())
}
