//! Threadchat LLM Service
//!
//! Provides chat completion against hosted text-generation APIs:
//! - OpenAI Chat Completions (the default real provider)
//! - Anthropic Messages API
//! - Mock service with simulated responses for testing and local demos

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod anthropic;
pub mod mock;
pub mod openai;

pub use mock::MockLlmService;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("LLM configuration error: {0}")]
    Configuration(String),

    #[error("LLM request error: {0}")]
    Request(String),

    #[error("LLM response error: {0}")]
    Response(String),

    #[error("LLM rate limit exceeded")]
    RateLimit,

    #[error("LLM request timed out")]
    Timeout,
}

impl From<reqwest::Error> for LlmError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LlmError::Timeout
        } else {
            LlmError::Request(format!("HTTP request failed: {}", e))
        }
    }
}

/// Role of a message sent to the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LlmRole {
    System,
    User,
    Assistant,
}

impl LlmRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            LlmRole::System => "system",
            LlmRole::User => "user",
            LlmRole::Assistant => "assistant",
        }
    }
}

/// A single role-tagged message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LlmMessage {
    pub role: LlmRole,
    pub content: String,
}

/// Chat completion request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model name; empty means the service default
    pub model: String,
    pub system_prompt: Option<String>,
    pub messages: Vec<LlmMessage>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// Chat completion response (one assistant reply)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub content: String,
    pub model: String,
    pub input_tokens: i32,
    pub output_tokens: i32,
    pub stop_reason: String,
}

/// LLM service configuration
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Provider name (openai, anthropic, mock)
    pub provider: String,
    pub api_key: String,
    pub default_model: String,
    /// Override for the provider's API base URL (proxies, local gateways)
    pub base_url: Option<String>,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl LlmConfig {
    /// Create LLM config from environment variables
    pub fn from_env() -> Result<Self, LlmError> {
        dotenvy::dotenv().ok();

        let provider = std::env::var("LLM_PROVIDER")
            .unwrap_or_else(|_| "mock".to_string())
            .to_ascii_lowercase();

        let provider_key_var = match provider.as_str() {
            "openai" => Some("OPENAI_API_KEY"),
            "anthropic" => Some("ANTHROPIC_API_KEY"),
            _ => None,
        };

        let api_key = std::env::var("LLM_API_KEY")
            .ok()
            .or_else(|| provider_key_var.and_then(|var| std::env::var(var).ok()))
            .unwrap_or_default();

        if provider_key_var.is_some() && api_key.is_empty() {
            return Err(LlmError::Configuration(format!(
                "LLM_API_KEY is required for provider {}",
                provider
            )));
        }

        let default_model =
            std::env::var("LLM_MODEL").unwrap_or_else(|_| default_model_for(&provider).to_string());

        let base_url = std::env::var("LLM_BASE_URL").ok();

        let max_tokens = match std::env::var("LLM_MAX_TOKENS") {
            Ok(v) => v
                .parse()
                .map_err(|_| LlmError::Configuration(format!("Invalid LLM_MAX_TOKENS: {}", v)))?,
            Err(_) => 1024,
        };

        let temperature = match std::env::var("LLM_TEMPERATURE") {
            Ok(v) => v
                .parse()
                .map_err(|_| LlmError::Configuration(format!("Invalid LLM_TEMPERATURE: {}", v)))?,
            Err(_) => 0.0,
        };

        Ok(Self {
            provider,
            api_key,
            default_model,
            base_url,
            max_tokens,
            temperature,
        })
    }

    /// Mock configuration, used by tests and when no provider is configured
    pub fn mock() -> Self {
        Self {
            provider: "mock".to_string(),
            api_key: String::new(),
            default_model: default_model_for("mock").to_string(),
            base_url: None,
            max_tokens: 1024,
            temperature: 0.0,
        }
    }
}

fn default_model_for(provider: &str) -> &'static str {
    match provider {
        "openai" => openai::DEFAULT_MODEL,
        "anthropic" => anthropic::DEFAULT_MODEL,
        _ => mock::MOCK_MODEL,
    }
}

/// LLM service trait for different providers
#[async_trait::async_trait]
pub trait LlmService: Send + Sync {
    /// Send a chat completion request and await exactly one reply
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;
}

/// LLM service factory
pub struct LlmServiceFactory;

impl LlmServiceFactory {
    /// Create LLM service based on configuration
    pub fn create(config: LlmConfig) -> Result<Box<dyn LlmService>, LlmError> {
        match config.provider.as_str() {
            "openai" => {
                tracing::info!(model = %config.default_model, "Creating OpenAI LLM service");
                Ok(Box::new(openai::OpenAiService::new(config)))
            }
            "anthropic" => {
                tracing::info!(model = %config.default_model, "Creating Anthropic LLM service");
                Ok(Box::new(anthropic::AnthropicService::new(config)))
            }
            "mock" => {
                tracing::info!("Creating mock LLM service");
                Ok(Box::new(mock::MockLlmService::new()))
            }
            provider => Err(LlmError::Configuration(format!(
                "Unknown LLM provider: {}. Supported providers: openai, anthropic, mock",
                provider
            ))),
        }
    }
}
