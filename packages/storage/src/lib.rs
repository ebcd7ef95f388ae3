// ABOUTME: Data layer and persistence for Taskboard
// ABOUTME: SQLite-backed stores for buckets, tasks, and task history

pub mod buckets;
pub mod db;
pub mod error;
pub mod history;
pub mod tasks;
pub mod types;

// Re-export main types
pub use db::{connect, connect_in_memory};
pub use error::{StorageError, StorageResult};
pub use types::{Bucket, ChangeType, HistoryEntry, Task};
