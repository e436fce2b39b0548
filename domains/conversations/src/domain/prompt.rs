//! Prompt composition
//!
//! A prompt is a system instruction rendered from a template, followed by
//! the trimmed window verbatim.

use serde::{Deserialize, Serialize};
use threadchat_llm::CompletionRequest;

use super::entities::Message;

/// Placeholder substituted with the turn's language
pub const LANGUAGE_PLACEHOLDER: &str = "{language}";

const ASSISTANT_INSTRUCTION: &str =
    "You are a helpful assistant. Answer all questions to the best of your ability in {language}.";

const PIRATE_INSTRUCTION: &str =
    "You talk like a pirate. Answer all questions to the best of your ability.";

/// System instruction template
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    instruction: String,
}

impl PromptTemplate {
    pub fn new(instruction: impl Into<String>) -> Self {
        Self {
            instruction: instruction.into(),
        }
    }

    /// Helpful assistant answering in the requested language
    pub fn assistant() -> Self {
        Self::new(ASSISTANT_INSTRUCTION)
    }

    /// Ignores the language parameter
    pub fn pirate() -> Self {
        Self::new(PIRATE_INSTRUCTION)
    }

    /// Look up a built-in template by name
    pub fn preset(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "assistant" => Some(Self::assistant()),
            "pirate" => Some(Self::pirate()),
            _ => None,
        }
    }

    pub fn instruction(&self) -> &str {
        &self.instruction
    }

    /// Render the system instruction for `language`
    pub fn render(&self, language: &str) -> String {
        self.instruction.replace(LANGUAGE_PLACEHOLDER, language)
    }

    /// Build the model request for an already-trimmed window
    pub fn compose(&self, window: Vec<Message>, language: &str) -> ComposedPrompt {
        ComposedPrompt {
            system_instruction: self.render(language),
            messages: window,
        }
    }
}

impl Default for PromptTemplate {
    fn default() -> Self {
        Self::assistant()
    }
}

/// Resolve the language for a turn: trimmed input, or `default` when blank
pub fn resolve_language(requested: Option<&str>, default: &str) -> String {
    requested
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .unwrap_or(default)
        .to_string()
}

/// Final payload for the model: instruction followed by the window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComposedPrompt {
    pub system_instruction: String,
    pub messages: Vec<Message>,
}

impl ComposedPrompt {
    /// Convert into a completion request; an empty `model` selects the
    /// service default
    pub fn into_request(self, model: &str) -> CompletionRequest {
        CompletionRequest {
            model: model.to_string(),
            system_prompt: Some(self.system_instruction),
            messages: self.messages.iter().map(Into::into).collect(),
            max_tokens: None,
            temperature: None,
        }
    }
}
