//! Model provider adapters.
//!
//! ## Available Adapters
//!
//! - `OpenAiCompatibleChatModel` - OpenAI, Groq and Ollama chat over SSE
//! - `OpenAiCompatibleEmbeddings` - OpenAI and Ollama embeddings
//! - `ModelCatalog` - provider discovery and model selection
//! - `MockChatModel` / `MockEmbeddings` - configurable mocks for testing

mod embeddings;
mod mock_model;
mod model_catalog;
mod openai_compatible;
mod wire;

pub use embeddings::{OpenAiCompatibleEmbeddings, DEFAULT_OPENAI_EMBEDDING_MODEL};
pub use mock_model::{MockChatModel, MockEmbeddings, MockResponse};
pub use model_catalog::{
    EmbeddingsListing, ModelCatalog, ModelListing, ProviderError, GROQ_CHAT_MODELS,
    OPENAI_CHAT_MODELS,
};
pub use openai_compatible::{
    ollama_base_url, OpenAiCompatibleChatModel, OpenAiCompatibleConfig, GROQ_BASE_URL,
    OPENAI_BASE_URL,
};
