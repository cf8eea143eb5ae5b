//! Embedding Model Port - text to vector conversion used for reranking.

use async_trait::async_trait;
use std::sync::Arc;

use super::chat_model::{AIError, ProviderInfo};

/// Shared handle to a resolved embedding model.
pub type EmbeddingsRef = Arc<dyn EmbeddingModel>;

/// Port for embedding providers.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embeds a single query string.
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AIError>;

    /// Embeds several documents; output order matches input order.
    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AIError>;

    fn provider_info(&self) -> ProviderInfo;
}
