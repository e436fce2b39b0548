//! Domain model: messages, threads, the turn state machine, trimming and prompts

pub mod entities;
pub mod prompt;
pub mod state;
pub mod trim;
