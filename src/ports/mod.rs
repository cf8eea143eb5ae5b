//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the application and the outside world. Adapters implement these ports.
//!
//! - `FocusHandler` - Answer strategy selected by a focus mode
//! - `ChatModel` - Streaming language-model completions
//! - `EmbeddingModel` - Embeddings used for reranking
//! - `SearchEngine` - Meta-search backend

mod chat_model;
mod embeddings;
mod focus_handler;
mod search_engine;

pub use chat_model::{
    AIError, ChatModel, ChatModelRef, ChunkStream, CompletionRequest, CompletionResponse,
    FinishReason, Message, MessageRole, ProviderInfo, StreamChunk,
};
pub use embeddings::{EmbeddingModel, EmbeddingsRef};
pub use focus_handler::{FocusHandler, HandlerEventStream, HandlerInvocation};
pub use search_engine::{SearchEngine, SearchError, SearchHit, SearchOptions, SearchResults};
