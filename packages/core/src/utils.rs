// ABOUTME: Shared utility functions for Taskboard
// ABOUTME: Opaque ID generation for tasks, buckets, and history entries

/// Generate a unique task ID
pub fn generate_task_id() -> String {
    format!("task-{}", nanoid::nanoid!())
}

/// Generate a unique bucket ID
pub fn generate_bucket_id() -> String {
    format!("bucket-{}", nanoid::nanoid!())
}

/// Generate a unique history entry ID
pub fn generate_history_id() -> String {
    format!("hist-{}", nanoid::nanoid!())
}
