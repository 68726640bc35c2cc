//! Variation prompt builder.
//!
//! Turns a base message and one variation's free-text parameters into the
//! single instruction sent to the completion model. Both inputs are embedded
//! verbatim; nothing is escaped.

/// JSON key the model is instructed to answer with.
pub const VARIANT_MESSAGE_KEY: &str = "variant_message";

/// Fixed instructions that follow the inputs in every prompt.
const VARIATION_GUIDELINES: &str = r#"Guidelines:
- Preserve the core meaning of the original.
- Follow the provided parameters EXACTLY.
- Do NOT introduce new claims, offers, or fake information.
- Adjust tone, style, length, or framing as needed.
- Avoid hallucinations.
- If parameters conflict with the base message, keep the meaning intact and adjust only tone/phrasing.

OUTPUT FORMAT (MANDATORY):
Return ONLY valid JSON (no explanations, no markdown, no text before or after):
{
    "variant_message": ""
}"#;

/// Builds the instruction for one marketing message variation.
///
/// # Arguments
///
/// * `original_message` - The base message every variation rewrites
/// * `parameters_text` - Free-text rules for this variation; may be empty
///
/// # Examples
///
/// ```
/// use variant_forge::prompts::build_prompt;
///
/// let prompt = build_prompt("Spring sale: 20% off", "Make it playful");
/// assert!(prompt.contains("Spring sale: 20% off"));
/// assert!(prompt.contains("Make it playful"));
/// assert!(prompt.contains("variant_message"));
/// ```
pub fn build_prompt(original_message: &str, parameters_text: &str) -> String {
    format!(
        r#"
You are generating ONE marketing message variation.
Follow the instructions exactly.

Base Message:
{}

Variation Parameters (apply them strictly):
{}

{}
"#,
        original_message, parameters_text, VARIATION_GUIDELINES
    )
}
