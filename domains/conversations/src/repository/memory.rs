//! In-memory history store
//!
//! History lives for the lifetime of the process. No eviction.

use std::collections::HashMap;

use tokio::sync::RwLock;

use super::{HistoryStore, StoreError};
use crate::domain::entities::{Message, ThreadId};

#[derive(Debug, Default)]
pub struct InMemoryHistoryStore {
    threads: RwLock<HashMap<ThreadId, Vec<Message>>>,
}

impl InMemoryHistoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl HistoryStore for InMemoryHistoryStore {
    async fn get(&self, thread_id: &ThreadId) -> Result<Vec<Message>, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).cloned().unwrap_or_default())
    }

    async fn append(&self, thread_id: &ThreadId, message: Message) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        threads.entry(thread_id.clone()).or_default().push(message);
        Ok(())
    }

    async fn message_count(&self, thread_id: &ThreadId) -> Result<usize, StoreError> {
        let threads = self.threads.read().await;
        Ok(threads.get(thread_id).map_or(0, Vec::len))
    }

    async fn truncate(&self, thread_id: &ThreadId, len: usize) -> Result<(), StoreError> {
        let mut threads = self.threads.write().await;
        if let Some(messages) = threads.get_mut(thread_id) {
            messages.truncate(len);
            if messages.is_empty() {
                threads.remove(thread_id);
            }
        }
        Ok(())
    }

    async fn thread_ids(&self) -> Result<Vec<ThreadId>, StoreError> {
        let threads = self.threads.read().await;
        let mut ids: Vec<ThreadId> = threads.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}
