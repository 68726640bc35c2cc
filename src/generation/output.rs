//! Parsing of model output.
//!
//! The model is asked for `{"variant_message": "..."}` but nothing enforces
//! it. Output is classified into a [`VariantOutput`] instead of being treated
//! as an error, so malformed output always degrades to usable text.

use serde_json::Value;

/// Keys accepted as the variant text, in priority order.
pub const RESULT_KEYS: [&str; 3] = ["variant_message", "message", "result"];

/// What the model actually returned.
#[derive(Debug, Clone, PartialEq)]
pub enum VariantOutput {
    /// A JSON object carrying one of [`RESULT_KEYS`].
    Field { key: &'static str, text: String },
    /// Valid JSON without a known key.
    Json(Value),
    /// Anything that is not JSON.
    Text(String),
}

impl VariantOutput {
    /// Final message text for this output.
    pub fn into_message(self) -> String {
        match self {
            VariantOutput::Field { text, .. } => text,
            VariantOutput::Json(value) => value.to_string(),
            VariantOutput::Text(text) => text,
        }
    }

    /// Whether the model followed the output contract.
    pub fn is_structured(&self) -> bool {
        matches!(self, VariantOutput::Field { .. })
    }
}

/// Classify extracted model text.
pub fn parse_variant_output(text: &str) -> VariantOutput {
    let value: Value = match serde_json::from_str(text) {
        Ok(value) => value,
        Err(_) => return VariantOutput::Text(text.to_string()),
    };

    if let Some(object) = value.as_object() {
        for key in RESULT_KEYS {
            if let Some(field) = object.get(key) {
                return VariantOutput::Field {
                    key,
                    text: value_to_text(field),
                };
            }
        }
    }

    VariantOutput::Json(value)
}

/// Strings are used as-is; any other JSON value is rendered as JSON text.
pub(crate) fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
