//! AI provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// AI provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    /// Which provider to build
    #[serde(default)]
    pub provider: AiProvider,

    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Chat model name
    #[serde(default = "default_model")]
    pub model: String,

    /// Chat completions base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Sampling temperature for interview turns
    #[serde(default = "default_elicitation_temperature")]
    pub elicitation_temperature: f32,

    /// Sampling temperature for extraction
    #[serde(default)]
    pub extraction_temperature: f32,

    /// Output token cap for both engines
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,

    /// Candidates requested per interview turn
    #[serde(default = "default_candidates")]
    pub candidates: u32,
}

/// AI provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum AiProvider {
    #[default]
    OpenAI,
    /// Canned replies; for local development without an API key.
    Mock,
}

impl AiConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        self.openai_api_key
            .as_ref()
            .is_some_and(|k| !k.expose_secret().is_empty())
    }

    /// Validate AI configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.provider == AiProvider::OpenAI && !self.has_openai() {
            return Err(ValidationError::MissingRequired("OPENAI_API_KEY"));
        }
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ValidationError::InvalidBaseUrl);
        }
        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout);
        }
        if !(0.0..=2.0).contains(&self.elicitation_temperature) {
            return Err(ValidationError::InvalidTemperature("elicitation"));
        }
        if !(0.0..=2.0).contains(&self.extraction_temperature) {
            return Err(ValidationError::InvalidTemperature("extraction"));
        }
        if self.max_output_tokens == 0 {
            return Err(ValidationError::InvalidMaxTokens);
        }
        if !(1..=8).contains(&self.candidates) {
            return Err(ValidationError::InvalidCandidates);
        }
        Ok(())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            provider: AiProvider::default(),
            openai_api_key: None,
            model: default_model(),
            base_url: default_base_url(),
            timeout_secs: default_timeout(),
            elicitation_temperature: default_elicitation_temperature(),
            extraction_temperature: 0.0,
            max_output_tokens: default_max_output_tokens(),
            candidates: default_candidates(),
        }
    }
}

fn default_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout() -> u64 {
    45
}

fn default_elicitation_temperature() -> f32 {
    0.7
}

fn default_max_output_tokens() -> u32 {
    300
}

fn default_candidates() -> u32 {
    1
}
