//! Anthropic Messages API Implementation
//!
//! Calls the Anthropic Messages API (https://api.anthropic.com/v1/messages).
//! The Messages API only accepts `user`/`assistant` turns, so in-band system
//! messages are folded into the top-level `system` field.

use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::{CompletionRequest, CompletionResponse, LlmConfig, LlmError, LlmRole, LlmService};

const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const API_VERSION: &str = "2023-06-01";

pub const DEFAULT_MODEL: &str = "claude-3-5-haiku-latest";

#[derive(Debug, Serialize)]
struct MessagesRequest {
    model: String,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    messages: Vec<MessageBody>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, Serialize)]
struct MessageBody {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    model: String,
    stop_reason: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    content_type: String,
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: i32,
    output_tokens: i32,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(rename = "type")]
    error_type: String,
    message: String,
}

/// Anthropic LLM service implementation
pub struct AnthropicService {
    client: Client,
    config: LlmConfig,
    base_url: String,
}

impl AnthropicService {
    pub fn new(config: LlmConfig) -> Self {
        let base_url = config
            .base_url
            .clone()
            .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());

        Self {
            client: Client::new(),
            config,
            base_url,
        }
    }

    fn build_body(&self, request: CompletionRequest) -> MessagesRequest {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model
        };

        let mut system_parts: Vec<String> = request.system_prompt.into_iter().collect();
        let mut messages = Vec::with_capacity(request.messages.len());
        for m in request.messages {
            match m.role {
                LlmRole::System => system_parts.push(m.content),
                LlmRole::User | LlmRole::Assistant => messages.push(MessageBody {
                    role: m.role.as_str(),
                    content: m.content,
                }),
            }
        }

        MessagesRequest {
            model,
            max_tokens: request.max_tokens.unwrap_or(self.config.max_tokens),
            system: if system_parts.is_empty() {
                None
            } else {
                Some(system_parts.join("\n\n"))
            },
            messages,
            temperature: Some(request.temperature.unwrap_or(self.config.temperature)),
        }
    }
}

#[async_trait::async_trait]
impl LlmService for AnthropicService {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_body(request);
        let url = format!("{}/v1/messages", self.base_url);

        tracing::debug!(
            model = %body.model,
            max_tokens = %body.max_tokens,
            messages = body.messages.len(),
            "Sending Anthropic API request"
        );

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(LlmError::RateLimit);
        }

        if !status.is_success() {
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error body".to_string());

            if let Ok(error_response) = serde_json::from_str::<ErrorResponse>(&error_body) {
                return Err(LlmError::Response(format!(
                    "Anthropic API error ({}): {}",
                    error_response.error.error_type, error_response.error.message
                )));
            }

            return Err(LlmError::Response(format!(
                "Anthropic API returned {}: {}",
                status, error_body
            )));
        }

        let api_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Response(format!("Failed to parse response: {}", e)))?;

        let content = api_response
            .content
            .iter()
            .filter(|block| block.content_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<Vec<_>>()
            .join("");

        Ok(CompletionResponse {
            content,
            model: api_response.model,
            input_tokens: api_response.usage.input_tokens,
            output_tokens: api_response.usage.output_tokens,
            stop_reason: api_response
                .stop_reason
                .unwrap_or_else(|| "end_turn".to_string()),
        })
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }
}
