//! State machine for a single conversation turn
//!
//! Composing → AwaitingModel → Completed | Failed

pub use threadchat_common::StateError;
use serde::{Deserialize, Serialize};

/// Turn states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnState {
    /// History read, user message recorded, window trimmed, prompt built
    Composing,
    /// Waiting on the text-generation service
    AwaitingModel,
    Completed,
    Failed,
}

impl TurnState {
    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [TurnState] {
        match self {
            Self::Composing => &[Self::AwaitingModel],
            Self::AwaitingModel => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }
}

impl std::fmt::Display for TurnState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Composing => write!(f, "composing"),
            Self::AwaitingModel => write!(f, "awaiting_model"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Events that drive a turn forward
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TurnEvent {
    /// Prompt composed and handed to the model adapter
    PromptComposed,
    /// Model returned one reply
    ReplyReceived,
    /// Model call failed or timed out
    ModelFailed,
}

impl std::fmt::Display for TurnEvent {
    #[mutants::skip] // Only used in error messages
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PromptComposed => write!(f, "prompt_composed"),
            Self::ReplyReceived => write!(f, "reply_received"),
            Self::ModelFailed => write!(f, "model_failed"),
        }
    }
}

/// Turn state machine
pub struct TurnStateMachine;

impl TurnStateMachine {
    /// Attempt a state transition
    pub fn transition(current: TurnState, event: TurnEvent) -> Result<TurnState, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (TurnState::Composing, TurnEvent::PromptComposed) => TurnState::AwaitingModel,
            (TurnState::AwaitingModel, TurnEvent::ReplyReceived) => TurnState::Completed,
            (TurnState::AwaitingModel, TurnEvent::ModelFailed) => TurnState::Failed,
            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }
}
