//! Data model for a generate-then-export cycle.
//!
//! Everything here is transient: built for one batch, owned by the session,
//! dropped when the next batch replaces it.

use serde::{Deserialize, Serialize};

use crate::error::LlmError;
use crate::prompts::build_prompt;

/// A user-named request to rewrite the base message under free-text rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Variation {
    /// Display label; not required to be unique.
    pub name: String,
    /// Free-text parameters; may be empty.
    #[serde(default, alias = "params")]
    pub parameters: String,
}

impl Variation {
    /// Create a variation.
    pub fn new(name: impl Into<String>, parameters: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into(),
        }
    }

    /// Placeholder variation `V{n}` with no parameters.
    pub fn default_named(n: usize) -> Self {
        Self::new(format!("V{}", n), "")
    }
}

/// Base message plus the ordered variations to generate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchRequest {
    pub original_message: String,
    pub variations: Vec<Variation>,
}

impl BatchRequest {
    pub fn new(original_message: impl Into<String>, variations: Vec<Variation>) -> Self {
        Self {
            original_message: original_message.into(),
            variations,
        }
    }

    /// `(name, prompt)` pairs in variation order.
    pub fn prompts(&self) -> Vec<(String, String)> {
        self.variations
            .iter()
            .map(|v| {
                (
                    v.name.clone(),
                    build_prompt(&self.original_message, &v.parameters),
                )
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.variations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.variations.is_empty()
    }
}

/// One normalized result; `index` is 1-based and matches input position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantResult {
    pub index: usize,
    pub variant_message: String,
}

/// Results for a whole batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub results: Vec<VariantResult>,
}

impl BatchResult {
    /// Index already-final messages 1-based, in the given order.
    pub fn from_messages<I>(messages: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let results = messages
            .into_iter()
            .enumerate()
            .map(|(i, variant_message)| VariantResult {
                index: i + 1,
                variant_message,
            })
            .collect();
        Self { results }
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Pair each result with the variation name at the same position.
    pub fn to_rows(&self, variations: &[Variation]) -> Vec<ExportRow> {
        self.results
            .iter()
            .zip(variations)
            .map(|(result, variation)| {
                ExportRow::new(variation.name.clone(), result.variant_message.clone())
            })
            .collect()
    }
}

/// One `(name, message)` row, the unit the exporters consume.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportRow {
    pub variation_name: String,
    pub message: String,
}

impl ExportRow {
    pub fn new(variation_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            variation_name: variation_name.into(),
            message: message.into(),
        }
    }
}

impl<A: Into<String>, B: Into<String>> From<(A, B)> for ExportRow {
    fn from((name, message): (A, B)) -> Self {
        Self::new(name, message)
    }
}

/// Per-variation outcome when the batch is not aborted on failure.
#[derive(Debug, Clone, PartialEq)]
pub struct VariantOutcome {
    pub name: String,
    pub result: Result<String, LlmError>,
}

impl VariantOutcome {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }

    /// Message text, or an `[error] ...` marker for a failed variation.
    pub fn message_or_marker(&self) -> String {
        match &self.result {
            Ok(message) => message.clone(),
            Err(err) => format!("[error] {}", err),
        }
    }
}
