//! Trimming policy: the bounded window of history sent to the model
//!
//! Keeps the most recent messages that fit in `max_units`. A leading system
//! message can be pinned to the front, its cost reserved out of the budget.
//! The window always starts on a user message and never splits a message.

use serde::{Deserialize, Serialize};

use super::entities::{Message, MessageRole};

/// Default window size
pub const DEFAULT_MAX_UNITS: usize = 10;

/// Unit the window budget is measured in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WindowUnit {
    /// Every message costs one unit
    #[default]
    Messages,
    /// Roughly four characters per token, plus one per message
    EstimatedTokens,
}

impl WindowUnit {
    pub fn cost(&self, message: &Message) -> usize {
        match self {
            WindowUnit::Messages => 1,
            WindowUnit::EstimatedTokens => message.content.chars().count().div_ceil(4) + 1,
        }
    }
}

impl std::str::FromStr for WindowUnit {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "messages" => Ok(WindowUnit::Messages),
            "tokens" | "estimated_tokens" => Ok(WindowUnit::EstimatedTokens),
            other => Err(format!(
                "Unknown window unit: {}. Supported units: messages, tokens",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrimPolicy {
    pub max_units: usize,
    /// Pin a leading system message to the front of the window
    pub include_system: bool,
    pub unit: WindowUnit,
}

impl Default for TrimPolicy {
    fn default() -> Self {
        Self {
            max_units: DEFAULT_MAX_UNITS,
            include_system: true,
            unit: WindowUnit::Messages,
        }
    }
}

impl TrimPolicy {
    /// Total cost of `messages` in this policy's unit
    pub fn cost_of(&self, messages: &[Message]) -> usize {
        messages.iter().map(|m| self.unit.cost(m)).sum()
    }

    /// Derive the window for `history`. Returns an empty vector when no user
    /// message fits.
    pub fn apply(&self, history: &[Message]) -> Vec<Message> {
        let mut budget = self.max_units;

        let (pinned, rest) = match history.split_first() {
            Some((first, rest)) if self.include_system && first.role == MessageRole::System => {
                let cost = self.unit.cost(first);
                if cost <= budget {
                    budget -= cost;
                    (Some(first), rest)
                } else {
                    (None, rest)
                }
            }
            _ => (None, history),
        };

        let mut start = rest.len();
        let mut used = 0;
        for (i, message) in rest.iter().enumerate().rev() {
            let cost = self.unit.cost(message);
            if used + cost > budget {
                break;
            }
            used += cost;
            start = i;
        }

        let window = &rest[start..];
        let Some(first_user) = window.iter().position(Message::is_user) else {
            return Vec::new();
        };

        pinned
            .into_iter()
            .chain(&window[first_user..])
            .cloned()
            .collect()
    }
}
