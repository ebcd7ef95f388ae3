// ABOUTME: Task history store backed by SQLite
// ABOUTME: Append-only audit rows recorded inside the mutating transaction

use sqlx::{Row, SqliteConnection};
use tracing::debug;

use crate::error::StorageError;
use crate::types::HistoryEntry;

/// Append an audit row.
///
/// Must run on the same transaction as the mutation it describes.
pub async fn record(
    conn: &mut SqliteConnection,
    entry: &HistoryEntry,
) -> Result<(), StorageError> {
    debug!("Recording history for task: {}", entry.task_id);

    sqlx::query(
        r#"
        INSERT INTO task_history (
            id, task_id, username, change_type, field_name,
            old_value, new_value, recorded_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&entry.id)
    .bind(&entry.task_id)
    .bind(&entry.username)
    .bind(entry.change_type)
    .bind(&entry.field_name)
    .bind(&entry.old_value)
    .bind(&entry.new_value)
    .bind(entry.recorded_at)
    .execute(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    Ok(())
}

/// Load a task's audit rows, newest first
pub async fn for_task(
    conn: &mut SqliteConnection,
    task_id: &str,
) -> Result<Vec<HistoryEntry>, StorageError> {
    let rows = sqlx::query(
        "SELECT * FROM task_history WHERE task_id = ? ORDER BY recorded_at DESC, id",
    )
    .bind(task_id)
    .fetch_all(&mut *conn)
    .await
    .map_err(StorageError::Sqlx)?;

    rows.iter().map(row_to_entry).collect()
}

fn row_to_entry(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry, StorageError> {
    Ok(HistoryEntry {
        id: row.try_get("id")?,
        task_id: row.try_get("task_id")?,
        username: row.try_get("username")?,
        change_type: row.try_get("change_type")?,
        field_name: row.try_get("field_name")?,
        old_value: row.try_get("old_value")?,
        new_value: row.try_get("new_value")?,
        recorded_at: row.try_get("recorded_at")?,
    })
}
