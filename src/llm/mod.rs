//! LLM integration for variant-forge.
//!
//! This module provides the completion-provider seam and its HTTP
//! implementation for OpenAI-compatible chat-completions endpoints, plus the
//! retry policy used around each call.
//!
//! ```ignore
//! use variant_forge::config::GeneratorConfig;
//! use variant_forge::llm::{ChatCompletionsClient, CompletionRequest, LlmProvider};
//!
//! let config = GeneratorConfig::from_env()?;
//! let client = ChatCompletionsClient::new(&config)?;
//! let response = client
//!     .generate(CompletionRequest::for_prompt(&config, "Say hi"))
//!     .await?;
//! println!("{}", response.extract_text());
//! ```

pub mod completions;
pub mod retry;

pub use completions::{
    ChatCompletionsClient, CompletionRequest, CompletionResponse, LlmProvider, Message,
};
pub use retry::RetryPolicy;
