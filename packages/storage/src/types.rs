// ABOUTME: Record types for the Taskboard data layer
// ABOUTME: Tasks carry their in-bucket order as left/right neighbor ids

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single task on the board.
///
/// `left_id`/`right_id` are the ids of the neighboring tasks in the same
/// bucket; `None` marks the head/tail of the bucket's chain. The chain is
/// rebuilt from these links, never from insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub bucket_id: String,
    pub name: String,
    pub left_id: Option<String>,
    pub right_id: Option<String>,
    pub assigned_user: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A board column holding an unordered set of tasks
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bucket {
    pub id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "TEXT", rename_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeType {
    Edit,
    Delete,
}

/// One audit row describing a task mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub task_id: String,
    pub username: String,
    pub change_type: ChangeType,
    pub field_name: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub recorded_at: DateTime<Utc>,
}
