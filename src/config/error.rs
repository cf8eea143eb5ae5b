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
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid port number")]
    InvalidPort,

    #[error("Invalid bind address: {0}")]
    InvalidAddress(String),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(&'static str),

    #[error("Outbound buffer must be between 1 and 4096 frames")]
    InvalidBufferSize,

    #[error("Invalid URL for {0}: must start with http:// or https://")]
    InvalidUrl(&'static str),

    #[error("No model provider configured")]
    NoProviderConfigured,

    #[error("Unknown model provider '{0}'")]
    UnknownProvider(String),

    #[error("Provider '{0}' is selected but not configured")]
    ProviderNotConfigured(String),

    #[error("Rerank threshold must be between -1.0 and 1.0")]
    InvalidRerankThreshold,

    #[error("max_sources must be at least 1")]
    InvalidMaxSources,
}

/// Checks that `url` is an absolute http(s) URL.
pub(super) fn check_http_url(field: &'static str, url: &str) -> Result<(), ValidationError> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(ValidationError::InvalidUrl(field))
    }
}
