//! Thread API handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use threadchat_common::{Result, ValidatedJson};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::ConversationsState;
use crate::domain::entities::{Message, ThreadId, TurnInput};

/// Request for running one turn
#[derive(Debug, Deserialize, Validate)]
pub struct InvokeRequest {
    /// New user message; blank text is rejected by the orchestrator
    #[validate(length(min = 1, message = "user_text is required"))]
    pub user_text: String,
    /// Reply language; defaults to the configured language
    pub language: Option<String>,
}

/// Reply of one turn
#[derive(Debug, Serialize)]
pub struct InvokeResponse {
    pub reply_text: String,
}

/// Freshly minted thread identifier
#[derive(Debug, Serialize)]
pub struct CreateThreadResponse {
    pub thread_id: String,
}

/// Run one conversation turn on a thread
pub async fn invoke(
    State(state): State<ConversationsState>,
    Path(thread_id): Path<String>,
    ValidatedJson(req): ValidatedJson<InvokeRequest>,
) -> Result<Json<InvokeResponse>> {
    let input = TurnInput {
        thread_id,
        user_text: req.user_text,
        language: req.language,
    };

    let output = state.orchestrator.invoke(input).await?;

    Ok(Json(InvokeResponse {
        reply_text: output.reply_text,
    }))
}

/// List a thread's messages, oldest first
pub async fn list_messages(
    State(state): State<ConversationsState>,
    Path(thread_id): Path<String>,
) -> Result<Json<Vec<Message>>> {
    let messages = state.orchestrator.history(&thread_id).await?;
    Ok(Json(messages))
}

/// List threads that have history
pub async fn list_threads(
    State(state): State<ConversationsState>,
) -> Result<Json<Vec<ThreadId>>> {
    let threads = state.orchestrator.threads().await?;
    Ok(Json(threads))
}

/// Mint a new opaque thread identifier
pub async fn create_thread() -> (StatusCode, Json<CreateThreadResponse>) {
    let thread_id = Uuid::new_v4().to_string();
    tracing::debug!(thread_id = %thread_id, "Minted thread id");
    (StatusCode::CREATED, Json(CreateThreadResponse { thread_id }))
}
