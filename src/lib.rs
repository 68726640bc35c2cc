//! variant-forge: LLM-backed message variation generator.
//!
//! This library rewrites one base message once per named variation, fans the
//! calls out concurrently with retry, normalizes the answers, and exports the
//! results as CSV or XLSX.

// Core modules
pub mod cli;
pub mod config;
pub mod error;
pub mod export;
pub mod generation;
pub mod llm;
pub mod prompts;
pub mod session;

// Re-export commonly used error types
pub use error::{ExportError, InputError, LlmError, SessionError};
