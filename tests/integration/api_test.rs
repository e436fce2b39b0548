//! API endpoint integration tests
//!
//! Drives the composed router (threads, messages, turn invariants) against
//! an in-memory store and the mock model service.

#![allow(dead_code)]

mod common;
mod invariants;
mod messages;
mod threads;
