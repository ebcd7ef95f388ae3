// ABOUTME: Task store backed by SQLite
// ABOUTME: Row-level reads and writes; all writes run on the caller's transaction

use chrono::Utc;
use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::StorageError;
use crate::types::Task;

/// Load a single task by id
pub async fn find_by_id(
    conn: &mut SqliteConnection,
    task_id: &str,
) -> Result<Option<Task>, StorageError> {
    debug!("Fetching task: {}", task_id);

    let row = sqlx::query("SELECT * FROM tasks WHERE id = ?")
        .bind(task_id)
        .fetch_optional(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    row.map(|r| row_to_task(&r)).transpose()
}

/// Load every task in a bucket, in no particular order.
///
/// Order is a property of the left/right links, not of this query.
pub async fn in_bucket(
    conn: &mut SqliteConnection,
    bucket_id: &str,
) -> Result<Vec<Task>, StorageError> {
    debug!("Fetching tasks for bucket: {}", bucket_id);

    let rows = sqlx::query("SELECT * FROM tasks WHERE bucket_id = ?")
        .bind(bucket_id)
        .fetch_all(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    rows.iter().map(row_to_task).collect()
}

/// Load the tasks assigned to a user, oldest first
pub async fn find_by_assignee(
    conn: &mut SqliteConnection,
    username: &str,
) -> Result<Vec<Task>, StorageError> {
    debug!("Fetching tasks assigned to: {}", username);

    let rows = sqlx::query("SELECT * FROM tasks WHERE assigned_user = ? ORDER BY created_at")
        .bind(username)
        .fetch_all(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    rows.iter().map(row_to_task).collect()
}

/// Whether a bucket already holds a task with this name (case-insensitive),
/// optionally ignoring one task id (for renames).
pub async fn name_exists_in_bucket(
    conn: &mut SqliteConnection,
    bucket_id: &str,
    name: &str,
    exclude_task_id: Option<&str>,
) -> Result<bool, StorageError> {
    let count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM tasks
        WHERE bucket_id = ?
        AND LOWER(name) = LOWER(?)
        AND (? IS NULL OR id != ?)
        "#,
    )
    .bind(bucket_id)
    .bind(name)
    .bind(exclude_task_id)
    .bind(exclude_task_id)
    .fetch_one(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(count > 0)
}

/// Insert a new task record
pub async fn insert(conn: &mut SqliteConnection, task: &Task) -> Result<(), StorageError> {
    debug!("Creating task: {} in bucket: {}", task.id, task.bucket_id);

    sqlx::query(
        r#"
        INSERT INTO tasks (
            id, bucket_id, name, left_id, right_id, assigned_user,
            created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&task.id)
    .bind(&task.bucket_id)
    .bind(&task.name)
    .bind(&task.left_id)
    .bind(&task.right_id)
    .bind(&task.assigned_user)
    .bind(task.created_at)
    .bind(task.updated_at)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(())
}

/// Persist a mutated task record (name, bucket, links, assignment)
pub async fn save(conn: &mut SqliteConnection, task: &Task) -> Result<(), StorageError> {
    debug!("Saving task: {}", task.id);

    let now = Utc::now();

    sqlx::query(
        r#"
        UPDATE tasks
        SET bucket_id = ?, name = ?, left_id = ?, right_id = ?,
            assigned_user = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&task.bucket_id)
    .bind(&task.name)
    .bind(&task.left_id)
    .bind(&task.right_id)
    .bind(&task.assigned_user)
    .bind(now)
    .bind(&task.id)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(())
}

/// Delete a task record
pub async fn delete(conn: &mut SqliteConnection, task_id: &str) -> Result<(), StorageError> {
    debug!("Deleting task: {}", task_id);

    sqlx::query("DELETE FROM tasks WHERE id = ?")
        .bind(task_id)
        .execute(&mut *conn)
        .await
        .map_err(StorageError::Sqlx)?;

    Ok(())
}

fn row_to_task(row: &sqlx::sqlite::SqliteRow) -> Result<Task, StorageError> {
    Ok(Task {
        id: row.try_get("id")?,
        bucket_id: row.try_get("bucket_id")?,
        name: row.try_get("name")?,
        left_id: row.try_get("left_id")?,
        right_id: row.try_get("right_id")?,
        assigned_user: row.try_get("assigned_user")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}
