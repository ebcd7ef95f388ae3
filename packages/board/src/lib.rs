// ABOUTME: Ordered task list engine and position service for Taskboard
// ABOUTME: Doubly-linked task chains, transactional repositioning, cached views

pub mod cache;
pub mod chain;
pub mod error;
pub mod notify;
pub mod service;

// Re-export main types
pub use cache::{ViewCache, ViewKey};
pub use chain::Chain;
pub use error::BoardError;
pub use notify::{AssignmentNotifier, LogNotifier};
pub use service::TaskBoard;
