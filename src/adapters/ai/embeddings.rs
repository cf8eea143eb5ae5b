//! Embedding model for OpenAI-compatible `/embeddings` endpoints.

use async_trait::async_trait;
use reqwest::Client;

use super::openai_compatible::{http_client, OpenAiCompatibleConfig};
use super::wire::{self, EmbeddingsRequest, EmbeddingsResponse};
use crate::ports::{AIError, EmbeddingModel, ProviderInfo};

pub const DEFAULT_OPENAI_EMBEDDING_MODEL: &str = "text-embedding-3-large";

/// OpenAI-compatible embedding model (OpenAI or Ollama).
pub struct OpenAiCompatibleEmbeddings {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleEmbeddings {
    /// `config.model` names the embedding model.
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AIError> {
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl EmbeddingModel for OpenAiCompatibleEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AIError> {
        self.embed_documents(&[text.to_string()])
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No embedding in response"))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AIError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let body = EmbeddingsRequest {
            model: &self.config.model,
            input: texts,
        };
        let builder = self
            .client
            .post(self.embeddings_url())
            .timeout(self.config.timeout)
            .json(&body);
        let response = wire::authorize(builder, self.config.api_key())
            .send()
            .await
            .map_err(|e| wire::send_error(e, self.config.timeout))?;
        let response = wire::check_status(response).await?;

        let mut parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse embeddings: {}", e)))?;

        if parsed.data.len() != texts.len() {
            return Err(AIError::parse(format!(
                "Expected {} embeddings, got {}",
                texts.len(),
                parsed.data.len()
            )));
        }
        parsed.data.sort_by_key(|d| d.index);
        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(self.config.provider.as_str(), &self.config.model).with_streaming(false)
    }
}
