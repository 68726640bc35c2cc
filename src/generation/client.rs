//! Single-variation client: one prompt in, one variant message out.

use std::sync::Arc;

use crate::config::GeneratorConfig;
use crate::error::LlmError;
use crate::llm::{ChatCompletionsClient, CompletionRequest, LlmProvider, RetryPolicy};

use super::output::{parse_variant_output, VariantOutput};

/// Sends a prompt to the completion provider with retry and parses the answer.
///
/// Cheap to clone; the provider is shared read-only across concurrent calls.
#[derive(Clone)]
pub struct VariantClient {
    provider: Arc<dyn LlmProvider>,
    config: GeneratorConfig,
    retry: RetryPolicy,
}

impl VariantClient {
    /// Create a client over an existing provider.
    ///
    /// The retry budget comes from `config.max_retries` with the default
    /// 1s-doubling, 8s-capped schedule.
    pub fn new(provider: Arc<dyn LlmProvider>, config: GeneratorConfig) -> Self {
        let retry = RetryPolicy::new(config.max_retries);
        Self {
            provider,
            config,
            retry,
        }
    }

    /// Create a client backed by [`ChatCompletionsClient`].
    pub fn from_config(config: GeneratorConfig) -> Result<Self, LlmError> {
        let provider = ChatCompletionsClient::new(&config)?;
        Ok(Self::new(Arc::new(provider), config))
    }

    /// Replace the retry policy.
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// The active retry policy.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// The configuration requests are built from.
    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Generate one variation and return its message text.
    ///
    /// Call errors are retried per the policy and the last one is returned
    /// once the budget is spent. Malformed model output is never retried; it
    /// degrades to the raw text.
    pub async fn generate_variation(&self, prompt: &str) -> Result<String, LlmError> {
        self.generate_output(prompt)
            .await
            .map(VariantOutput::into_message)
    }

    /// Generate one variation and return the classified model output.
    pub async fn generate_output(&self, prompt: &str) -> Result<VariantOutput, LlmError> {
        let text = self.complete_text(prompt).await?;
        let output = parse_variant_output(&text);
        if !output.is_structured() {
            tracing::debug!(
                chars = text.len(),
                "Model output did not follow the JSON contract, using fallback text"
            );
        }
        Ok(output)
    }

    /// Call the provider with retry and return the extracted response text.
    pub async fn complete_text(&self, prompt: &str) -> Result<String, LlmError> {
        let response = self
            .retry
            .run(|attempt| {
                let request = CompletionRequest::for_prompt(&self.config, prompt);
                let provider = Arc::clone(&self.provider);
                async move {
                    tracing::debug!(attempt = attempt + 1, "Requesting variation");
                    provider.generate(request).await
                }
            })
            .await?;

        Ok(response.extract_text())
    }
}
