//! Mock LLM Service Implementation
//!
//! Used by `LlmServiceFactory` when provider is `"mock"`. Returns a
//! deterministic simulated reply, records every request it receives, and can
//! be switched into a failing mode or given artificial latency.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use crate::{CompletionRequest, CompletionResponse, LlmError, LlmService};

pub const MOCK_MODEL: &str = "mock-model";

/// Mock LLM service for testing and local demos
#[derive(Debug, Clone, Default)]
pub struct MockLlmService {
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    failure: Option<LlmError>,
    delay: Option<Duration>,
}

impl MockLlmService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that rejects every request with `error`
    pub fn failing(error: LlmError) -> Self {
        Self {
            failure: Some(error),
            ..Self::default()
        }
    }

    /// Sleep for `delay` before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// All requests received so far, oldest first
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn last_request(&self) -> Option<CompletionRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// The reply the mock produces for a given request
    pub fn reply_for(request: &CompletionRequest) -> String {
        let last_message = request
            .messages
            .last()
            .map(|m| m.content.as_str())
            .unwrap_or("empty");
        format!("Mock response to: {}", last_message)
    }
}

#[async_trait::async_trait]
impl LlmService for MockLlmService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        tracing::info!(
            messages = request.messages.len(),
            "Mock LLM service processing completion request"
        );

        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request.clone());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(error) = &self.failure {
            return Err(error.clone());
        }

        let model = if request.model.is_empty() {
            MOCK_MODEL.to_string()
        } else {
            request.model.clone()
        };

        let content = Self::reply_for(&request);
        let input_tokens = request
            .messages
            .iter()
            .map(|m| m.content.len() as i32 / 4)
            .sum::<i32>();
        let output_tokens = content.len() as i32 / 4;

        Ok(CompletionResponse {
            content,
            model,
            input_tokens,
            output_tokens,
            stop_reason: "end_turn".to_string(),
        })
    }

    fn default_model(&self) -> &str {
        MOCK_MODEL
    }
}
