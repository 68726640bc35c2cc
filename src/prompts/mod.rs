//! LLM prompts for message variation generation.
//!
//! - [`variation`] - The per-variation rewrite instruction and its JSON output contract

pub mod variation;

pub use variation::{build_prompt, VARIANT_MESSAGE_KEY};
