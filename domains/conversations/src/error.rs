//! Turn-level errors and their mapping onto the shared application error

use thiserror::Error;

use crate::domain::state::StateError;
use crate::repository::StoreError;

/// Errors produced while running a conversation turn
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TurnError {
    /// Rejected before any history mutation
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The text-generation call failed (transport, auth, quota, timeout)
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    State(#[from] StateError),
}

impl From<TurnError> for threadchat_common::Error {
    fn from(err: TurnError) -> Self {
        match err {
            TurnError::InvalidInput(msg) => threadchat_common::Error::Validation(msg),
            TurnError::ModelUnavailable(msg) => threadchat_common::Error::ModelUnavailable(msg),
            TurnError::Store(e) => threadchat_common::Error::Internal(e.to_string()),
            TurnError::State(e) => threadchat_common::Error::Internal(e.to_string()),
        }
    }
}
