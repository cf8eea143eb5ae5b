//! Model provider configuration

use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

use super::error::{check_http_url, ValidationError};

/// Model provider configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// OpenAI API key
    pub openai_api_key: Option<Secret<String>>,

    /// Groq API key
    pub groq_api_key: Option<Secret<String>>,

    /// Ollama base URL, e.g. `http://localhost:11434`
    pub ollama_endpoint: Option<String>,

    /// Provider used for chat; first configured provider when unset
    pub chat_provider: Option<ModelProvider>,

    /// Chat model; first model of the chat provider when unset
    pub chat_model: Option<String>,

    /// Provider used for embeddings
    #[serde(default)]
    pub embeddings_provider: ModelProvider,

    /// Embedding model; provider default when unset
    pub embeddings_model: Option<String>,

    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Maximum retries on failure
    #[serde(default = "default_retries")]
    pub max_retries: u32,
}

/// Model provider type
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    #[default]
    OpenAI,
    Groq,
    Ollama,
}

impl ModelProvider {
    pub fn all() -> [ModelProvider; 3] {
        [Self::OpenAI, Self::Groq, Self::Ollama]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OpenAI => "openai",
            Self::Groq => "groq",
            Self::Ollama => "ollama",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        Self::all()
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(name.trim()))
    }
}

impl fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ProvidersConfig {
    /// Get timeout as Duration
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Check if OpenAI is configured
    pub fn has_openai(&self) -> bool {
        has_key(&self.openai_api_key)
    }

    /// Check if Groq is configured
    pub fn has_groq(&self) -> bool {
        has_key(&self.groq_api_key)
    }

    /// Check if Ollama is configured
    pub fn has_ollama(&self) -> bool {
        self.ollama_endpoint
            .as_ref()
            .is_some_and(|e| !e.trim().is_empty())
    }

    pub fn is_configured(&self, provider: ModelProvider) -> bool {
        match provider {
            ModelProvider::OpenAI => self.has_openai(),
            ModelProvider::Groq => self.has_groq(),
            ModelProvider::Ollama => self.has_ollama(),
        }
    }

    /// Providers with credentials or an endpoint, in preference order.
    pub fn configured(&self) -> Vec<ModelProvider> {
        ModelProvider::all()
            .into_iter()
            .filter(|p| self.is_configured(*p))
            .collect()
    }

    /// Validate provider configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.configured().is_empty() {
            return Err(ValidationError::NoProviderConfigured);
        }

        if let Some(provider) = self.chat_provider {
            if !self.is_configured(provider) {
                return Err(ValidationError::ProviderNotConfigured(provider.to_string()));
            }
        }

        match self.embeddings_provider {
            ModelProvider::Groq => {
                return Err(ValidationError::UnknownProvider(
                    "groq (no embeddings support)".to_string(),
                ))
            }
            provider if !self.is_configured(provider) => {
                return Err(ValidationError::ProviderNotConfigured(provider.to_string()));
            }
            _ => {}
        }

        if let Some(endpoint) = self.ollama_endpoint.as_deref().filter(|e| !e.trim().is_empty()) {
            check_http_url("ollama_endpoint", endpoint)?;
        }

        if self.timeout_secs == 0 {
            return Err(ValidationError::InvalidTimeout("providers.timeout_secs"));
        }

        Ok(())
    }
}

fn has_key(key: &Option<Secret<String>>) -> bool {
    key.as_ref().is_some_and(|k| !k.expose_secret().is_empty())
}

impl Default for ProvidersConfig {
    fn default() -> Self {
        Self {
            openai_api_key: None,
            groq_api_key: None,
            ollama_endpoint: None,
            chat_provider: None,
            chat_model: None,
            embeddings_provider: ModelProvider::default(),
            embeddings_model: None,
            timeout_secs: default_timeout(),
            max_retries: default_retries(),
        }
    }
}

fn default_timeout() -> u64 {
    120
}

fn default_retries() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(value: &str) -> Option<Secret<String>> {
        Some(Secret::new(value.to_string()))
    }

    #[test]
    fn test_defaults() {
        let config = ProvidersConfig::default();
        assert_eq!(config.timeout(), Duration::from_secs(120));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.embeddings_provider, ModelProvider::OpenAI);
        assert!(config.configured().is_empty());
    }

    #[test]
    fn test_no_provider_is_rejected() {
        assert_eq!(
            ProvidersConfig::default().validate(),
            Err(ValidationError::NoProviderConfigured)
        );
    }

    #[test]
    fn test_empty_key_does_not_count() {
        let config = ProvidersConfig {
            openai_api_key: key(""),
            ..Default::default()
        };
        assert!(!config.has_openai());
    }

    #[test]
    fn test_openai_only_is_valid() {
        let config = ProvidersConfig {
            openai_api_key: key("sk-test"),
            ..Default::default()
        };
        assert!(config.validate().is_ok());
        assert_eq!(config.configured(), vec![ModelProvider::OpenAI]);
    }

    #[test]
    fn test_selected_chat_provider_must_be_configured() {
        let config = ProvidersConfig {
            openai_api_key: key("sk-test"),
            chat_provider: Some(ModelProvider::Groq),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::ProviderNotConfigured("groq".to_string()))
        );
    }

    #[test]
    fn test_groq_cannot_embed() {
        let config = ProvidersConfig {
            groq_api_key: key("gsk-test"),
            embeddings_provider: ModelProvider::Groq,
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ValidationError::UnknownProvider(_))
        ));
    }

    #[test]
    fn test_ollama_endpoint_must_be_http() {
        let config = ProvidersConfig {
            ollama_endpoint: Some("localhost:11434".to_string()),
            embeddings_provider: ModelProvider::Ollama,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidUrl("ollama_endpoint"))
        );
    }

    #[test]
    fn test_provider_names_parse_case_insensitively() {
        assert_eq!(ModelProvider::parse("OpenAI"), Some(ModelProvider::OpenAI));
        assert_eq!(ModelProvider::parse(" ollama "), Some(ModelProvider::Ollama));
        assert_eq!(ModelProvider::parse("anthropic"), None);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = ProvidersConfig {
            openai_api_key: key("sk-very-secret"),
            ..Default::default()
        };
        assert!(!format!("{config:?}").contains("sk-very-secret"));
    }
}
