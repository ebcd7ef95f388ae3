// ABOUTME: Assignment notification boundary
// ABOUTME: Delivery (email or otherwise) lives behind this trait, outside the core

use async_trait::async_trait;
use tracing::info;

/// Notified after an assignment commits.
///
/// Implementations own their delivery and their failures; a lost
/// notification never fails the assignment itself.
#[async_trait]
pub trait AssignmentNotifier: Send + Sync {
    async fn task_assigned(&self, username: &str, task_name: &str);
}

/// Default notifier that only logs the assignment
pub struct LogNotifier;

#[async_trait]
impl AssignmentNotifier for LogNotifier {
    async fn task_assigned(&self, username: &str, task_name: &str) {
        info!("Task '{}' assigned to user: {}", task_name, username);
    }
}
