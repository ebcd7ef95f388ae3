// ABOUTME: Error taxonomy for board operations
// ABOUTME: Splits user-correctable failures from internal faults and retryable conflicts

use taskboard_storage::StorageError;
use thiserror::Error;
use tracing::error;

/// Board operation errors
#[derive(Error, Debug)]
pub enum BoardError {
    #[error("Task with id \"{0}\" not found")]
    TaskNotFound(String),
    #[error("Bucket with id \"{0}\" not found")]
    BucketNotFound(String),
    #[error("{0}")]
    InvalidName(String),
    #[error("Task name \"{name}\" already exists in bucket \"{bucket}\"")]
    DuplicateName { name: String, bucket: String },
    #[error("Bucket \"{0}\" already exists")]
    DuplicateBucket(String),
    #[error("Left task id equals the task being moved")]
    SelfReference,
    #[error("Task position can be changed only within the same bucket")]
    CrossBucketPosition,
    #[error("Assignee username can't be blank")]
    BlankAssignee,
    #[error("Board chain is corrupt: {0}")]
    Corrupt(String),
    #[error("Concurrent modification conflict: {0}")]
    Conflict(String),
    #[error("Storage error: {0}")]
    Storage(StorageError),
}

impl BoardError {
    /// Whether a caller may reasonably retry the operation unchanged
    pub fn is_retryable(&self) -> bool {
        matches!(self, BoardError::Conflict(_))
    }

    /// Whether this maps to a client-facing 4xx-equivalent response.
    ///
    /// `Corrupt`, `Conflict`, and `Storage` are server faults and must not
    /// leak internal detail to clients.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            BoardError::TaskNotFound(_)
                | BoardError::BucketNotFound(_)
                | BoardError::InvalidName(_)
                | BoardError::DuplicateName { .. }
                | BoardError::DuplicateBucket(_)
                | BoardError::SelfReference
                | BoardError::CrossBucketPosition
                | BoardError::BlankAssignee
        )
    }
}

impl From<StorageError> for BoardError {
    fn from(err: StorageError) -> Self {
        if err.is_busy() {
            BoardError::Conflict(err.to_string())
        } else {
            BoardError::Storage(err)
        }
    }
}

/// Build a `Corrupt` error, logging it at error severity.
///
/// Invariant violations indicate a bug rather than bad input.
pub(crate) fn corrupt(message: impl Into<String>) -> BoardError {
    let message = message.into();
    error!("Board invariant violated: {}", message);
    BoardError::Corrupt(message)
}
