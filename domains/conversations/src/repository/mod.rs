//! Message history storage for the Conversations domain

pub mod memory;

use thiserror::Error;

use crate::domain::entities::{Message, ThreadId};

pub use memory::InMemoryHistoryStore;

/// History store errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("History store unavailable: {0}")]
    Unavailable(String),
}

/// Ordered, append-only message history keyed by thread.
///
/// Unseen threads read as empty; the first append creates them.
#[async_trait::async_trait]
pub trait HistoryStore: Send + Sync {
    /// Full history of a thread, oldest first
    async fn get(&self, thread_id: &ThreadId) -> Result<Vec<Message>, StoreError>;

    /// Append one message to the end of a thread
    async fn append(&self, thread_id: &ThreadId, message: Message) -> Result<(), StoreError>;

    /// Number of messages in a thread
    async fn message_count(&self, thread_id: &ThreadId) -> Result<usize, StoreError>;

    /// Drop every message after the first `len`. Only used to undo the
    /// caller's own append of a failed turn.
    async fn truncate(&self, thread_id: &ThreadId, len: usize) -> Result<(), StoreError>;

    /// Threads holding at least one message, sorted
    async fn thread_ids(&self) -> Result<Vec<ThreadId>, StoreError>;
}
