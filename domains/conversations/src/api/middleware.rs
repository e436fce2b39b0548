//! Conversations domain state

use std::sync::Arc;

use crate::orchestrator::ThreadOrchestrator;

/// Application state for the Conversations domain
#[derive(Clone)]
pub struct ConversationsState {
    pub orchestrator: Arc<ThreadOrchestrator>,
}

impl ConversationsState {
    pub fn new(orchestrator: Arc<ThreadOrchestrator>) -> Self {
        Self { orchestrator }
    }
}
