//! Domain entities for Conversations domain
//!
//! Messages, thread identifiers and the input/output of a single turn.
//! Constructors validate their inputs so invalid values never reach history.

use serde::{Deserialize, Serialize};
use threadchat_llm::{LlmMessage, LlmRole};

use crate::error::TurnError;

/// Maximum thread identifier length in bytes
pub const MAX_THREAD_ID_LENGTH: usize = 200;

/// Language used when a turn does not name one
pub const DEFAULT_LANGUAGE: &str = "English";

/// Message role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    System,
    User,
    Assistant,
}

impl std::fmt::Display for MessageRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

impl From<MessageRole> for LlmRole {
    fn from(role: MessageRole) -> Self {
        match role {
            MessageRole::System => LlmRole::System,
            MessageRole::User => LlmRole::User,
            MessageRole::Assistant => LlmRole::Assistant,
        }
    }
}

/// A single entry in a thread's history. Never edited once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
}

impl Message {
    /// Create a system message
    pub fn system(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::System,
            content: content.into(),
        }
    }

    /// Create a user message; content must not be blank
    pub fn user(content: impl Into<String>) -> Result<Self, TurnError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(TurnError::InvalidInput(
                "Message content cannot be empty or whitespace-only".to_string(),
            ));
        }
        Ok(Message {
            role: MessageRole::User,
            content,
        })
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Message {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

impl From<&Message> for LlmMessage {
    fn from(m: &Message) -> Self {
        LlmMessage {
            role: m.role.into(),
            content: m.content.clone(),
        }
    }
}

/// Opaque, caller-supplied conversation key
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ThreadId(String);

impl ThreadId {
    /// Validate and wrap a raw thread identifier
    pub fn parse(raw: impl Into<String>) -> Result<Self, TurnError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(TurnError::InvalidInput(
                "Thread id cannot be empty".to_string(),
            ));
        }
        if raw.len() > MAX_THREAD_ID_LENGTH {
            return Err(TurnError::InvalidInput(format!(
                "Thread id must be at most {} bytes",
                MAX_THREAD_ID_LENGTH
            )));
        }
        Ok(ThreadId(raw))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ThreadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ThreadId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Input of one conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnInput {
    pub thread_id: String,
    pub user_text: String,
    /// Falls back to the orchestrator's default language when absent or blank
    pub language: Option<String>,
}

impl TurnInput {
    pub fn new(thread_id: impl Into<String>, user_text: impl Into<String>) -> Self {
        Self {
            thread_id: thread_id.into(),
            user_text: user_text.into(),
            language: None,
        }
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }
}

/// Output of one successful turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnOutput {
    pub reply_text: String,
}
