//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidBindAddress(String),

    #[error("Invalid request timeout")]
    InvalidTimeout,

    /// A completing turn makes two model calls inside one HTTP request.
    #[error("Request timeout ({request_secs}s) must exceed two AI timeouts ({ai_secs}s each)")]
    RequestTimeoutTooShort { request_secs: u64, ai_secs: u64 },

    #[error("Temperature for {0} must be between 0.0 and 2.0")]
    InvalidTemperature(&'static str),

    #[error("Candidate count must be between 1 and 8")]
    InvalidCandidates,

    #[error("Max output tokens must be greater than zero")]
    InvalidMaxTokens,

    #[error("Base URL must start with http:// or https://")]
    InvalidBaseUrl,
}
