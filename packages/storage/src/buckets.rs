// ABOUTME: Bucket store backed by SQLite
// ABOUTME: Buckets are board columns; their task order lives on the tasks

use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::StorageError;
use crate::types::Bucket;

/// Load a bucket by id
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    bucket_id: &str,
) -> Result<Option<Bucket>, StorageError> {
    debug!("Fetching bucket: {}", bucket_id);

    let row = sqlx::query("SELECT * FROM buckets WHERE id = ?")
        .bind(bucket_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    row.map(|r| row_to_bucket(&r)).transpose()
}

/// Load a bucket by exact name
pub async fn find_by_name(
    conn: &mut SqliteConnection,
    name: &str,
) -> Result<Option<Bucket>, StorageError> {
    let row = sqlx::query("SELECT * FROM buckets WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    row.map(|r| row_to_bucket(&r)).transpose()
}

/// Load all buckets, oldest first
pub async fn all(conn: &mut SqliteConnection) -> Result<Vec<Bucket>, StorageError> {
    let rows = sqlx::query("SELECT * FROM buckets ORDER BY created_at")
        .fetch_all(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    rows.iter().map(row_to_bucket).collect()
}

/// Insert a new bucket record
pub async fn insert(conn: &mut SqliteConnection, bucket: &Bucket) -> Result<(), StorageError> {
    debug!("Creating bucket: {} ({})", bucket.name, bucket.id);

    sqlx::query("INSERT INTO buckets (id, name, created_at) VALUES (?, ?, ?)")
        .bind(&bucket.id)
        .bind(&bucket.name)
        .bind(bucket.created_at)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    Ok(())
}

fn row_to_bucket(row: &sqlx::sqlite::SqliteRow) -> Result<Bucket, StorageError> {
    Ok(Bucket {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}
