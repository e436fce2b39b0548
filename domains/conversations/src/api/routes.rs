//! Route definitions for Conversations domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::threads;
use super::middleware::ConversationsState;

/// Thread listing and minting
fn thread_routes() -> Router<ConversationsState> {
    Router::new().route(
        "/v1/threads",
        get(threads::list_threads).post(threads::create_thread),
    )
}

/// Turn and history routes
fn turn_routes() -> Router<ConversationsState> {
    Router::new()
        .route("/v1/threads/{thread_id}/invoke", post(threads::invoke))
        .route("/v1/threads/{thread_id}/messages", get(threads::list_messages))
}

/// Create all Conversations domain API routes
pub fn routes() -> Router<ConversationsState> {
    Router::new().merge(thread_routes()).merge(turn_routes())
}
