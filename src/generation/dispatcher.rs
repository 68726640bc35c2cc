//! Concurrent fan-out of variation prompts.
//!
//! Every prompt becomes an independent future; the futures are joined in
//! input order so each result lands at its original position no matter
//! which call finishes first.

use futures::future::{join_all, try_join_all};
use std::time::Instant;
use tracing::info;

use crate::error::LlmError;

use super::client::VariantClient;
use super::types::{BatchRequest, VariantOutcome};

/// How a failed variation affects the rest of the batch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// First exhausted-retry error aborts the batch; in-flight calls are dropped.
    #[default]
    AbortBatch,
    /// Every variation reports its own outcome; successes are kept.
    KeepGoing,
}

/// Runs one [`VariantClient`] call per variation.
#[derive(Clone)]
pub struct Dispatcher {
    client: VariantClient,
}

impl Dispatcher {
    pub fn new(client: VariantClient) -> Self {
        Self { client }
    }

    /// Generate all prompts concurrently; abort on the first failure.
    ///
    /// Returns `(name, message)` pairs in input order.
    pub async fn dispatch(
        &self,
        prompts: Vec<(String, String)>,
    ) -> Result<Vec<(String, String)>, LlmError> {
        if prompts.is_empty() {
            return Ok(Vec::new());
        }

        let futures = prompts.into_iter().map(|(name, prompt)| async move {
            let message = self.client.generate_variation(&prompt).await?;
            Ok::<_, LlmError>((name, message))
        });

        try_join_all(futures).await
    }

    /// Generate all prompts concurrently; never aborts.
    ///
    /// Returns one outcome per prompt, in input order.
    pub async fn dispatch_settled(&self, prompts: Vec<(String, String)>) -> Vec<VariantOutcome> {
        if prompts.is_empty() {
            return Vec::new();
        }

        let futures = prompts.into_iter().map(|(name, prompt)| async move {
            let result = self.client.generate_variation(&prompt).await;
            if let Err(ref err) = result {
                tracing::warn!(variation = %name, error = %err, "Variation failed");
            }
            VariantOutcome { name, result }
        });

        join_all(futures).await
    }

    /// Build prompts for a batch and dispatch them under `policy`.
    ///
    /// Under [`FailurePolicy::AbortBatch`] the outcomes are all successes or
    /// the error is returned; under [`FailurePolicy::KeepGoing`] this never
    /// returns `Err`.
    pub async fn run(
        &self,
        request: &BatchRequest,
        policy: FailurePolicy,
    ) -> Result<Vec<VariantOutcome>, LlmError> {
        let start = Instant::now();
        let prompts = request.prompts();

        info!(
            variations = prompts.len(),
            policy = ?policy,
            model = %self.client.config().model,
            "Generating variations"
        );

        let outcomes = match policy {
            FailurePolicy::AbortBatch => self
                .dispatch(prompts)
                .await?
                .into_iter()
                .map(|(name, message)| VariantOutcome {
                    name,
                    result: Ok(message),
                })
                .collect::<Vec<_>>(),
            FailurePolicy::KeepGoing => self.dispatch_settled(prompts).await,
        };

        let failed = outcomes.iter().filter(|o| !o.is_ok()).count();
        info!(
            variations = outcomes.len(),
            failed = failed,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Generation complete"
        );

        Ok(outcomes)
    }
}
