//! OpenAI-compatible chat-completions client.
//!
//! Sends one non-streaming request per call and hands the decoded JSON body
//! back untouched. Providers disagree on where the generated text lives, so
//! callers read it through [`CompletionResponse::extract_text`].

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::GeneratorConfig;
use crate::error::LlmError;

/// A message in a conversation with an LLM.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (e.g., "system", "user", "assistant").
    pub role: String,
    /// Content of the message.
    pub content: String,
}

impl Message {
    /// Create a new system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    /// Create a new user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Request body for `POST /chat/completions`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier to use for generation.
    pub model: String,
    /// Conversation messages.
    pub messages: Vec<Message>,
    /// Sampling temperature (0.0 - 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    /// Maximum number of tokens to generate.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_completion_tokens: Option<u32>,
    /// Nucleus sampling parameter (0.0 - 1.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f64>,
    /// Always false: responses are read whole.
    #[serde(default)]
    pub stream: bool,
}

impl CompletionRequest {
    /// Create a new request with provider-default sampling parameters.
    pub fn new(model: impl Into<String>, messages: Vec<Message>) -> Self {
        Self {
            model: model.into(),
            messages,
            temperature: None,
            max_completion_tokens: None,
            top_p: None,
            stream: false,
        }
    }

    /// Build the single-user-message request used for every variation,
    /// with sampling parameters taken from the configuration.
    pub fn for_prompt(config: &GeneratorConfig, prompt: impl Into<String>) -> Self {
        Self::new(config.model.clone(), vec![Message::user(prompt)])
            .with_temperature(config.temperature)
            .with_max_completion_tokens(config.max_completion_tokens)
            .with_top_p(config.top_p)
    }

    /// Set the temperature for this request.
    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the max completion tokens for this request.
    pub fn with_max_completion_tokens(mut self, max_tokens: u32) -> Self {
        self.max_completion_tokens = Some(max_tokens);
        self
    }

    /// Set the top_p for this request.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = Some(top_p);
        self
    }
}

/// Decoded response body from the completion endpoint.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    /// The response exactly as the provider returned it.
    pub raw: Value,
}

impl CompletionResponse {
    /// Wrap a decoded response body.
    pub fn new(raw: Value) -> Self {
        Self { raw }
    }

    /// Text of `choices[0].message.content`, if present.
    pub fn message_content(&self) -> Option<&str> {
        self.first_choice()?.get("message")?.get("content")?.as_str()
    }

    /// Text of `choices[0].text` (legacy completions shape), if present.
    pub fn choice_text(&self) -> Option<&str> {
        self.first_choice()?.get("text")?.as_str()
    }

    /// Generated text using the shape-tolerant fallback chain:
    /// message content, then plain choice text, then the whole body as JSON.
    pub fn extract_text(&self) -> String {
        if let Some(content) = self.message_content() {
            return content.to_string();
        }
        if let Some(text) = self.choice_text() {
            return text.to_string();
        }
        self.raw.to_string()
    }

    fn first_choice(&self) -> Option<&Value> {
        self.raw.get("choices")?.as_array()?.first()
    }
}

/// Trait for LLM providers that can answer a completion request.
///
/// Implementations perform exactly one call per invocation; retrying is the
/// caller's concern.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Generate a response for the given request.
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Error response from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

/// Error detail from the API.
#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Client for OpenAI-compatible chat-completions APIs (Groq by default).
pub struct ChatCompletionsClient {
    /// HTTP client for making API requests.
    http_client: Client,
    /// API key for bearer authentication.
    api_key: String,
    /// Base URL for the API.
    api_base: String,
}

impl ChatCompletionsClient {
    /// Create a client from the generator configuration.
    ///
    /// # Errors
    ///
    /// Returns `LlmError::MissingApiKey` when no credential is configured and
    /// `LlmError::InvalidRequest` if the HTTP client cannot be built.
    pub fn new(config: &GeneratorConfig) -> Result<Self, LlmError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or(LlmError::MissingApiKey)?;

        let http_client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| LlmError::InvalidRequest(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
        })
    }

    /// Get the API base URL.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// Get the API key (for debugging, returns masked value).
    pub fn api_key_masked(&self) -> String {
        let chars: Vec<char> = self.api_key.chars().collect();
        if chars.len() <= 8 {
            "*".repeat(chars.len())
        } else {
            let head: String = chars[..4].iter().collect();
            let tail: String = chars[chars.len() - 4..].iter().collect();
            format!("{}...{}", head, tail)
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.api_base)
    }
}

#[async_trait]
impl LlmProvider for ChatCompletionsClient {
    async fn generate(&self, request: CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let url = self.endpoint();

        tracing::debug!(
            url = %url,
            model = %request.model,
            api_key = %self.api_key_masked(),
            "Sending chat completion request"
        );

        let http_response = self
            .http_client
            .post(&url)
            .header("Content-Type", "application/json")
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request)
            .send()
            .await
            .map_err(|e| LlmError::RequestFailed(e.to_string()))?;

        let status = http_response.status();

        if !status.is_success() {
            let status_code = status.as_u16();
            let error_text = http_response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to read error response".to_string());

            let message = serde_json::from_str::<ApiErrorResponse>(&error_text)
                .map(|parsed| parsed.error.message)
                .unwrap_or(error_text);

            if status_code == 429 {
                return Err(LlmError::RateLimited(message));
            }

            return Err(LlmError::ApiError {
                code: status_code,
                message,
            });
        }

        let raw: Value = http_response
            .json()
            .await
            .map_err(|e| LlmError::ParseError(format!("Failed to parse API response: {}", e)))?;

        Ok(CompletionResponse::new(raw))
    }
}
