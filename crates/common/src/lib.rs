//! Shared utilities, configuration, and error handling for Threadchat
//!
//! This crate provides common functionality used across the Threadchat workspace:
//! - Configuration management following 12-factor principles
//! - Error types and their HTTP mapping
//! - Request extractors
//! - State machine errors

pub mod config;
pub mod error;
pub mod extractors;
pub mod state;

pub use config::{Config, LogFormat};
pub use error::{Error, Result};
pub use extractors::ValidatedJson;
pub use state::StateError;
