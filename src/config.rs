//! Generator configuration.
//!
//! Holds the completion-endpoint connection settings, the sampling parameters
//! sent with every request, and the retry budget for each variation call.

use std::time::Duration;
use thiserror::Error;

/// Default OpenAI-compatible endpoint (Groq).
pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";

/// Default completion model.
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Environment variable holding the API credential.
pub const API_KEY_ENV: &str = "GROQ_API_KEY";

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    /// Configuration validation failed.
    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Configuration for the completion client and the variant pipeline.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    // Connection settings
    /// API credential sent as a bearer token.
    pub api_key: Option<String>,
    /// Base URL of the OpenAI-compatible API.
    pub api_base: String,
    /// Model identifier sent with every request.
    pub model: String,
    /// HTTP timeout for a single completion call.
    pub request_timeout: Duration,

    // Sampling settings
    /// Sampling temperature.
    pub temperature: f64,
    /// Nucleus sampling parameter.
    pub top_p: f64,
    /// Maximum number of tokens the model may generate.
    pub max_completion_tokens: u32,

    // Retry settings
    /// Total attempts per variation before the error is propagated.
    pub max_retries: u32,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(120),

            temperature: 0.7,
            top_p: 1.0,
            max_completion_tokens: 600,

            max_retries: 3,
        }
    }
}

impl GeneratorConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `GROQ_API_KEY`: API credential (required)
    /// - `VARIANT_FORGE_API_BASE`: API base URL (default: Groq OpenAI-compatible endpoint)
    /// - `VARIANT_FORGE_MODEL`: Model identifier (default: llama-3.3-70b-versatile)
    /// - `VARIANT_FORGE_TEMPERATURE`: Sampling temperature (default: 0.7)
    /// - `VARIANT_FORGE_MAX_RETRIES`: Attempts per variation (default: 3)
    /// - `VARIANT_FORGE_TIMEOUT_SECS`: Request timeout in seconds (default: 120)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the credential is missing or a value is invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds configuration from an arbitrary key lookup.
    ///
    /// `from_env` delegates here; tests pass a map-backed closure.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        let api_key = lookup(API_KEY_ENV)
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar(API_KEY_ENV.to_string()))?;
        config.api_key = Some(api_key);

        if let Some(val) = lookup("VARIANT_FORGE_API_BASE") {
            config.api_base = val;
        }

        if let Some(val) = lookup("VARIANT_FORGE_MODEL") {
            config.model = val;
        }

        if let Some(val) = lookup("VARIANT_FORGE_TEMPERATURE") {
            config.temperature = parse_env_value(&val, "VARIANT_FORGE_TEMPERATURE")?;
        }

        if let Some(val) = lookup("VARIANT_FORGE_MAX_RETRIES") {
            config.max_retries = parse_env_value(&val, "VARIANT_FORGE_MAX_RETRIES")?;
        }

        if let Some(val) = lookup("VARIANT_FORGE_TIMEOUT_SECS") {
            let secs: u64 = parse_env_value(&val, "VARIANT_FORGE_TIMEOUT_SECS")?;
            config.request_timeout = Duration::from_secs(secs);
        }

        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration values.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::ValidationFailed` if any values are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_base.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "api_base cannot be empty".to_string(),
            ));
        }

        if self.model.trim().is_empty() {
            return Err(ConfigError::ValidationFailed(
                "model cannot be empty".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationFailed(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(ConfigError::ValidationFailed(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&self.top_p) {
            return Err(ConfigError::ValidationFailed(
                "top_p must be between 0.0 and 1.0".to_string(),
            ));
        }

        if self.max_completion_tokens == 0 {
            return Err(ConfigError::ValidationFailed(
                "max_completion_tokens must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }

    /// Builder method to set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder method to set the API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into();
        self
    }

    /// Builder method to set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Builder method to set the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Builder method to set the temperature.
    pub fn with_temperature(mut self, temp: f64) -> Self {
        self.temperature = temp;
        self
    }

    /// Builder method to set top_p.
    pub fn with_top_p(mut self, top_p: f64) -> Self {
        self.top_p = top_p;
        self
    }

    /// Builder method to set the max completion tokens.
    pub fn with_max_completion_tokens(mut self, tokens: u32) -> Self {
        self.max_completion_tokens = tokens;
        self
    }

    /// Builder method to set the retry budget.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }
}

/// Parses an environment variable value.
fn parse_env_value<T: std::str::FromStr>(value: &str, key: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        message: format!("cannot parse '{}'", value),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.api_base, DEFAULT_API_BASE);
        assert_eq!(config.model, "llama-3.3-70b-versatile");
        assert_eq!(config.temperature, 0.7);
        assert_eq!(config.top_p, 1.0);
        assert_eq!(config.max_completion_tokens, 600);
        assert_eq!(config.max_retries, 3);
        assert!(config.api_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_builder() {
        let config = GeneratorConfig::new()
            .with_api_key("gsk_test")
            .with_api_base("http://localhost:8080/v1")
            .with_model("llama-3.1-8b-instant")
            .with_temperature(0.2)
            .with_top_p(0.9)
            .with_max_completion_tokens(128)
            .with_max_retries(5)
            .with_request_timeout(Duration::from_secs(10));

        assert_eq!(config.api_key.as_deref(), Some("gsk_test"));
        assert_eq!(config.api_base, "http://localhost:8080/v1");
        assert_eq!(config.model, "llama-3.1-8b-instant");
        assert_eq!(config.temperature, 0.2);
        assert_eq!(config.top_p, 0.9);
        assert_eq!(config.max_completion_tokens, 128);
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_from_lookup_requires_api_key() {
        let result = GeneratorConfig::from_lookup(lookup_from(&[]));
        assert!(matches!(result, Err(ConfigError::MissingEnvVar(ref k)) if k == API_KEY_ENV));

        let result = GeneratorConfig::from_lookup(lookup_from(&[(API_KEY_ENV, "   ")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_from_lookup_overrides() {
        let config = GeneratorConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "gsk_abc"),
            ("VARIANT_FORGE_MODEL", "mixtral"),
            ("VARIANT_FORGE_MAX_RETRIES", "5"),
            ("VARIANT_FORGE_TIMEOUT_SECS", "30"),
            ("VARIANT_FORGE_TEMPERATURE", "1.1"),
        ]))
        .expect("config should load");

        assert_eq!(config.api_key.as_deref(), Some("gsk_abc"));
        assert_eq!(config.model, "mixtral");
        assert_eq!(config.max_retries, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert_eq!(config.temperature, 1.1);
        assert_eq!(config.api_base, DEFAULT_API_BASE);
    }

    #[test]
    fn test_from_lookup_invalid_number() {
        let result = GeneratorConfig::from_lookup(lookup_from(&[
            (API_KEY_ENV, "gsk_abc"),
            ("VARIANT_FORGE_MAX_RETRIES", "many"),
        ]));
        let err = result.unwrap_err();
        assert!(err.to_string().contains("VARIANT_FORGE_MAX_RETRIES"));
    }

    #[test]
    fn test_validation_empty_model() {
        let config = GeneratorConfig::default().with_model("");
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("model"));
    }

    #[test]
    fn test_validation_invalid_temperature() {
        let config = GeneratorConfig::default().with_temperature(3.0);
        let result = config.validate();
        assert!(result.unwrap_err().to_string().contains("temperature"));
    }

    #[test]
    fn test_validation_invalid_top_p() {
        let config = GeneratorConfig::default().with_top_p(1.5);
        assert!(config.validate().unwrap_err().to_string().contains("top_p"));
    }

    #[test]
    fn test_validation_zero_tokens_and_timeout() {
        let config = GeneratorConfig::default().with_max_completion_tokens(0);
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("max_completion_tokens"));

        let config = GeneratorConfig::default().with_request_timeout(Duration::ZERO);
        assert!(config
            .validate()
            .unwrap_err()
            .to_string()
            .contains("request_timeout"));
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::MissingEnvVar("TEST_VAR".to_string());
        assert!(err.to_string().contains("TEST_VAR"));

        let err = ConfigError::InvalidValue {
            key: "KEY".to_string(),
            message: "bad value".to_string(),
        };
        assert!(err.to_string().contains("KEY"));
        assert!(err.to_string().contains("bad value"));
    }
}
