//! Conversations domain: chat threads, history trimming, turn orchestration

pub mod api;
pub mod domain;
pub mod error;
pub mod orchestrator;
pub mod repository;

// Re-export domain types at the crate root for convenience
pub use domain::entities::{Message, MessageRole, ThreadId, TurnInput, TurnOutput};
pub use domain::prompt::{ComposedPrompt, PromptTemplate};
pub use domain::state::{StateError, TurnEvent, TurnState, TurnStateMachine};
pub use domain::trim::{TrimPolicy, WindowUnit};

pub use error::TurnError;
pub use orchestrator::{OrchestratorConfig, ThreadOrchestrator};

// Re-export repository types
pub use repository::{HistoryStore, InMemoryHistoryStore, StoreError};

// Re-export API types
pub use api::routes;
pub use api::ConversationsState;
