//! Variation generation pipeline.
//!
//! Prompts are built per variation, fanned out concurrently through the
//! [`Dispatcher`] and answered by the [`VariantClient`] with retry. Raw model
//! responses collected elsewhere can be normalized by [`aggregate`] into a
//! [`BatchResult`].
//!
//! ```ignore
//! use variant_forge::config::GeneratorConfig;
//! use variant_forge::generation::{
//!     BatchRequest, Dispatcher, FailurePolicy, VariantClient, Variation,
//! };
//!
//! let client = VariantClient::from_config(GeneratorConfig::from_env()?)?;
//! let dispatcher = Dispatcher::new(client);
//! let request = BatchRequest::new(
//!     "Spring sale: 20% off everything",
//!     vec![Variation::new("Playful", "Add an emoji, keep it short")],
//! );
//! let outcomes = dispatcher.run(&request, FailurePolicy::AbortBatch).await?;
//! ```

pub mod aggregator;
pub mod client;
pub mod dispatcher;
pub mod output;
pub mod types;

pub use aggregator::aggregate;
pub use client::VariantClient;
pub use dispatcher::{Dispatcher, FailurePolicy};
pub use output::{parse_variant_output, VariantOutput, RESULT_KEYS};
pub use types::{BatchRequest, BatchResult, ExportRow, VariantOutcome, VariantResult, Variation};
