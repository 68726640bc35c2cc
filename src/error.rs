//! Error types for variant-forge operations.
//!
//! Defines error types for the major subsystems:
//! - Completion API calls (retried by the variant client)
//! - User input checks performed before generation or export
//! - CSV / XLSX export
//! - Session-level operations that combine the above
//!
//! Malformed model output is deliberately absent: it is represented by
//! [`crate::generation::VariantOutput`] and never surfaces as an error.

use thiserror::Error;

/// Errors that can occur while calling the completion API.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum LlmError {
    #[error("Missing API key: GROQ_API_KEY environment variable not set")]
    MissingApiKey,

    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

impl LlmError {
    /// Whether the error looks like a transient condition (network, 429, 5xx).
    ///
    /// The variant client retries every call error regardless; this is used
    /// to pick the log level for a failed attempt.
    pub fn is_transient(&self) -> bool {
        match self {
            LlmError::RequestFailed(_) | LlmError::RateLimited(_) => true,
            LlmError::ApiError { code, .. } => *code >= 500 || *code == 429 || *code == 408,
            _ => false,
        }
    }
}

/// Non-fatal problems with what the user asked for.
///
/// These are reported as warnings and the requested operation is skipped.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum InputError {
    #[error("Please enter an original message")]
    EmptyMessage,

    #[error("Add at least one variation")]
    NoVariations,

    #[error("Nothing to export")]
    NothingToExport,

    #[error("Invalid variation '{0}': expected NAME=PARAMETERS")]
    InvalidVariation(String),
}

/// Errors that can occur while writing export files.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Spreadsheet archive error: {0}")]
    Archive(#[from] zip::result::ZipError),

    #[error("Unsupported export format '{0}': expected csv or xlsx")]
    UnsupportedFormat(String),
}

/// Errors surfaced by [`crate::session::Session`] operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Input(#[from] InputError),

    #[error(transparent)]
    Llm(#[from] LlmError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

impl SessionError {
    /// Whether this error should be shown as a warning rather than a failure.
    pub fn is_user_input(&self) -> bool {
        matches!(self, SessionError::Input(_))
    }
}
