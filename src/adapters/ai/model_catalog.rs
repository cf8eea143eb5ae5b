//! Discovery and selection of chat and embedding models.
//!
//! OpenAI and Groq models are fixed lists; Ollama models are read from the
//! server's `/api/tags`. A provider that fails to load is logged and left out
//! of the catalog instead of failing startup.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

use super::embeddings::{OpenAiCompatibleEmbeddings, DEFAULT_OPENAI_EMBEDDING_MODEL};
use super::openai_compatible::{OpenAiCompatibleChatModel, OpenAiCompatibleConfig};
use crate::config::{ModelProvider, ProvidersConfig};
use crate::ports::{AIError, ChatModelRef, EmbeddingsRef};

pub const OPENAI_CHAT_MODELS: &[&str] = &["gpt-3.5-turbo", "gpt-4"];

pub const GROQ_CHAT_MODELS: &[&str] = &[
    "llama3-8b-8192",
    "llama3-70b-8192",
    "mixtral-8x7b-32768",
    "gemma-7b-it",
];

/// Errors selecting a model.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider '{0}'")]
    UnknownProvider(String),

    #[error("no models available from provider '{0}'")]
    ProviderUnavailable(String),

    #[error("model '{model}' is not available from provider '{provider}'")]
    UnknownModel { provider: String, model: String },

    #[error("no chat provider is available")]
    NoChatProvider,

    #[error("embeddings provider '{0}' is not available")]
    EmbeddingsUnavailable(String),

    #[error("model discovery failed: {0}")]
    Discovery(String),

    #[error(transparent)]
    Client(#[from] AIError),
}

/// Models offered per provider, as served on `/api/models`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModelListing {
    pub chat_models: BTreeMap<String, Vec<String>>,
    pub embeddings: Option<EmbeddingsListing>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EmbeddingsListing {
    pub provider: String,
    pub model: String,
}

/// Catalog of the chat models each configured provider offers.
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    config: ProvidersConfig,
    chat: BTreeMap<ModelProvider, Vec<String>>,
}

impl ModelCatalog {
    /// Builds the catalog from `config`, querying Ollama when configured.
    pub async fn discover(config: &ProvidersConfig) -> Self {
        let mut chat = BTreeMap::new();

        if config.has_openai() {
            chat.insert(ModelProvider::OpenAI, to_owned(OPENAI_CHAT_MODELS));
        }
        if config.has_groq() {
            chat.insert(ModelProvider::Groq, to_owned(GROQ_CHAT_MODELS));
        }
        if let Some(endpoint) = config.ollama_endpoint.as_deref().filter(|_| config.has_ollama()) {
            match fetch_ollama_models(endpoint, config).await {
                Ok(models) if models.is_empty() => {
                    tracing::warn!(endpoint, "Ollama reported no models");
                }
                Ok(models) => {
                    tracing::info!(endpoint, count = models.len(), "loaded Ollama models");
                    chat.insert(ModelProvider::Ollama, models);
                }
                Err(err) => {
                    tracing::warn!(endpoint, error = %err, "error loading Ollama models");
                }
            }
        }

        Self::from_models(config.clone(), chat)
    }

    /// Builds a catalog from known model lists without network access.
    pub fn from_models(config: ProvidersConfig, chat: BTreeMap<ModelProvider, Vec<String>>) -> Self {
        Self { config, chat }
    }

    pub fn chat_models(&self) -> &BTreeMap<ModelProvider, Vec<String>> {
        &self.chat
    }

    pub fn is_empty(&self) -> bool {
        self.chat.is_empty()
    }

    /// Resolves the configured chat selection.
    pub fn resolve_default(&self) -> Result<ChatModelRef, ProviderError> {
        let provider = self.config.chat_provider.map(|p| p.as_str());
        self.resolve(provider, self.config.chat_model.as_deref())
    }

    /// Resolves a chat model.
    ///
    /// Without a provider the first available one is used; without a model
    /// the provider's first model is used.
    pub fn resolve(&self, provider: Option<&str>, model: Option<&str>) -> Result<ChatModelRef, ProviderError> {
        let provider = match provider {
            Some(name) => ModelProvider::parse(name)
                .ok_or_else(|| ProviderError::UnknownProvider(name.to_string()))?,
            None => *self.chat.keys().next().ok_or(ProviderError::NoChatProvider)?,
        };

        let models = self
            .chat
            .get(&provider)
            .ok_or_else(|| ProviderError::ProviderUnavailable(provider.to_string()))?;

        let model = match model {
            Some(name) => models
                .iter()
                .find(|m| m.as_str() == name)
                .ok_or_else(|| ProviderError::UnknownModel {
                    provider: provider.to_string(),
                    model: name.to_string(),
                })?,
            None => models
                .first()
                .ok_or_else(|| ProviderError::ProviderUnavailable(provider.to_string()))?,
        };

        let config = self.endpoint_config(provider)?.with_model(model.clone());
        tracing::debug!(%provider, model = %config.model, "resolved chat model");
        Ok(Arc::new(OpenAiCompatibleChatModel::new(config)?))
    }

    /// Resolves the configured embedding model.
    pub fn resolve_embeddings(&self) -> Result<EmbeddingsRef, ProviderError> {
        let (provider, model) = self.embeddings_selection()?;
        let config = self.endpoint_config(provider)?.with_model(model);
        Ok(Arc::new(OpenAiCompatibleEmbeddings::new(config)?))
    }

    pub fn listing(&self) -> ModelListing {
        ModelListing {
            chat_models: self
                .chat
                .iter()
                .map(|(provider, models)| (provider.to_string(), models.clone()))
                .collect(),
            embeddings: self
                .embeddings_selection()
                .ok()
                .map(|(provider, model)| EmbeddingsListing {
                    provider: provider.to_string(),
                    model,
                }),
        }
    }

    fn embeddings_selection(&self) -> Result<(ModelProvider, String), ProviderError> {
        let provider = self.config.embeddings_provider;
        let unavailable = || ProviderError::EmbeddingsUnavailable(provider.to_string());
        if provider == ModelProvider::Groq || !self.config.is_configured(provider) {
            return Err(unavailable());
        }

        let model = match (&self.config.embeddings_model, provider) {
            (Some(model), _) => model.clone(),
            (None, ModelProvider::OpenAI) => DEFAULT_OPENAI_EMBEDDING_MODEL.to_string(),
            (None, _) => self
                .chat
                .get(&provider)
                .and_then(|models| models.first())
                .cloned()
                .ok_or_else(unavailable)?,
        };
        Ok((provider, model))
    }

    fn endpoint_config(&self, provider: ModelProvider) -> Result<OpenAiCompatibleConfig, ProviderError> {
        let missing = || ProviderError::ProviderUnavailable(provider.to_string());
        let config = match provider {
            ModelProvider::OpenAI => {
                OpenAiCompatibleConfig::openai(self.config.openai_api_key.clone().ok_or_else(missing)?)
            }
            ModelProvider::Groq => {
                OpenAiCompatibleConfig::groq(self.config.groq_api_key.clone().ok_or_else(missing)?)
            }
            ModelProvider::Ollama => {
                OpenAiCompatibleConfig::ollama(self.config.ollama_endpoint.as_deref().ok_or_else(missing)?)
            }
        };
        Ok(config
            .with_timeout(self.config.timeout())
            .with_max_retries(self.config.max_retries))
    }
}

fn to_owned(models: &[&str]) -> Vec<String> {
    models.iter().map(|m| m.to_string()).collect()
}

#[derive(Debug, Deserialize)]
struct OllamaTags {
    models: Vec<OllamaModel>,
}

#[derive(Debug, Deserialize)]
struct OllamaModel {
    model: String,
}

async fn fetch_ollama_models(endpoint: &str, config: &ProvidersConfig) -> Result<Vec<String>, ProviderError> {
    let client = Client::builder()
        .timeout(config.timeout())
        .build()
        .map_err(|e| ProviderError::Discovery(e.to_string()))?;

    let url = format!("{}/api/tags", endpoint.trim_end_matches('/'));
    let response = client
        .get(url)
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| ProviderError::Discovery(e.to_string()))?;
    let tags: OllamaTags = response
        .json()
        .await
        .map_err(|e| ProviderError::Discovery(e.to_string()))?;

    Ok(tags.models.into_iter().map(|m| m.model).collect())
}
