//! Normalization of raw model responses into [`BatchResult`]s.

use serde_json::Value;

use crate::prompts::VARIANT_MESSAGE_KEY;

use super::output::value_to_text;
use super::types::BatchResult;

/// Normalize raw responses, keeping input order and assigning 1-based indices.
///
/// A response that is a JSON object with `variant_message` contributes that
/// value; anything else is used verbatim. Never fails.
pub fn aggregate<S: AsRef<str>>(raw_responses: &[S]) -> BatchResult {
    BatchResult::from_messages(raw_responses.iter().map(|raw| normalize(raw.as_ref())))
}

fn normalize(raw: &str) -> String {
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => map
            .get(VARIANT_MESSAGE_KEY)
            .map(value_to_text)
            .unwrap_or_else(|| raw.to_string()),
        _ => raw.to_string(),
    }
}
