//! Mock chat and embedding models for testing.
//!
//! # Features
//!
//! - Pre-configured responses consumed in order
//! - Simulated per-chunk delays for timeout testing
//! - Error injection, both up front and mid-stream
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let model = MockChatModel::new()
//!     .with_response("It is sunny.")
//!     .with_delay(Duration::from_millis(10));
//!
//! let response = model.complete(request).await?;
//! assert_eq!(response.content, "It is sunny.");
//! ```

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{
    AIError, ChatModel, ChunkStream, CompletionRequest, CompletionResponse, EmbeddingModel,
    FinishReason, ProviderInfo, StreamChunk,
};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// A configured mock response.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// Return a successful completion.
    Success { content: String },
    /// Fail before producing anything.
    Error(AIError),
    /// Stream `partial`, then fail.
    FailMidStream { partial: String, error: AIError },
}

/// Mock chat model.
#[derive(Debug, Clone)]
pub struct MockChatModel {
    responses: Arc<Mutex<VecDeque<MockResponse>>>,
    info: ProviderInfo,
    /// Delay before each streamed chunk and before one-shot responses.
    delay: Duration,
    calls: Arc<Mutex<Vec<CompletionRequest>>>,
}

impl Default for MockChatModel {
    fn default() -> Self {
        Self::new()
    }
}

impl MockChatModel {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(VecDeque::new())),
            info: ProviderInfo::new("mock", "mock-model-1"),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Adds a successful response to the queue.
    pub fn with_response(self, content: impl Into<String>) -> Self {
        self.push(MockResponse::Success {
            content: content.into(),
        })
    }

    /// Adds an error response to the queue.
    pub fn with_error(self, error: AIError) -> Self {
        self.push(MockResponse::Error(error))
    }

    /// Adds a response that fails after streaming `partial`.
    pub fn with_mid_stream_error(self, partial: impl Into<String>, error: AIError) -> Self {
        self.push(MockResponse::FailMidStream {
            partial: partial.into(),
            error,
        })
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_provider_info(mut self, info: ProviderInfo) -> Self {
        self.info = info;
        self
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn get_calls(&self) -> Vec<CompletionRequest> {
        lock(&self.calls).clone()
    }

    fn push(self, response: MockResponse) -> Self {
        lock(&self.responses).push_back(response);
        self
    }

    fn next_response(&self) -> MockResponse {
        lock(&self.responses)
            .pop_front()
            .unwrap_or_else(|| MockResponse::Success {
                content: "Mock response".to_string(),
            })
    }

    /// Splits text into word chunks that concatenate back to the input.
    fn chunks(content: &str) -> Vec<Result<StreamChunk, AIError>> {
        content
            .split_inclusive(' ')
            .map(|word| Ok(StreamChunk::content(word)))
            .collect()
    }
}

#[async_trait]
impl ChatModel for MockChatModel {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_response() {
            MockResponse::Success { content } => Ok(CompletionResponse {
                content,
                model: self.info.model.clone(),
                finish_reason: FinishReason::Stop,
            }),
            MockResponse::Error(err) | MockResponse::FailMidStream { error: err, .. } => Err(err),
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        lock(&self.calls).push(request);

        let (mut chunks, tail) = match self.next_response() {
            MockResponse::Success { content } => (
                Self::chunks(&content),
                Ok(StreamChunk::finished(FinishReason::Stop)),
            ),
            MockResponse::FailMidStream { partial, error } => (Self::chunks(&partial), Err(error)),
            MockResponse::Error(err) => return Err(err),
        };
        chunks.push(tail);

        let delay = self.delay;
        let stream = stream::iter(chunks).then(move |chunk| async move {
            if !delay.is_zero() {
                sleep(delay).await;
            }
            chunk
        });
        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

/// Mock embedding model.
///
/// Embeds text as lowercase letter frequencies, so texts sharing vocabulary
/// score higher under cosine similarity.
#[derive(Debug, Clone, Default)]
pub struct MockEmbeddings {
    calls: Arc<Mutex<usize>>,
    fail: Option<AIError>,
}

impl MockEmbeddings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every call fail with `error`.
    pub fn failing(error: AIError) -> Self {
        Self {
            calls: Arc::default(),
            fail: Some(error),
        }
    }

    pub fn call_count(&self) -> usize {
        *lock(&self.calls)
    }

    /// The vector this mock produces for `text`.
    pub fn vector(text: &str) -> Vec<f32> {
        let mut vector = vec![0.0; 26];
        for byte in text.bytes().filter(u8::is_ascii_alphabetic) {
            vector[usize::from(byte.to_ascii_lowercase() - b'a')] += 1.0;
        }
        vector
    }

    fn record(&self) -> Result<(), AIError> {
        *lock(&self.calls) += 1;
        match &self.fail {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl EmbeddingModel for MockEmbeddings {
    async fn embed_query(&self, text: &str) -> Result<Vec<f32>, AIError> {
        self.record()?;
        Ok(Self::vector(text))
    }

    async fn embed_documents(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, AIError> {
        self.record()?;
        Ok(texts.iter().map(|text| Self::vector(text)).collect())
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new("mock", "mock-embeddings").with_streaming(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::MessageRole;

    fn test_request() -> CompletionRequest {
        CompletionRequest::new().with_message(MessageRole::User, "Hello")
    }

    async fn collect(mut stream: ChunkStream) -> (String, Option<AIError>) {
        let mut content = String::new();
        while let Some(chunk) = stream.next().await {
            match chunk {
                Ok(chunk) => content.push_str(&chunk.delta),
                Err(err) => return (content, Some(err)),
            }
        }
        (content, None)
    }

    mod chat {
        use super::*;

        #[tokio::test]
        async fn returns_responses_in_order_then_default() {
            let model = MockChatModel::new().with_response("First").with_response("Second");

            assert_eq!(model.complete(test_request()).await.unwrap().content, "First");
            assert_eq!(model.complete(test_request()).await.unwrap().content, "Second");
            assert_eq!(
                model.complete(test_request()).await.unwrap().content,
                "Mock response"
            );
            assert_eq!(model.call_count(), 3);
        }

        #[tokio::test]
        async fn streamed_chunks_concatenate_to_the_response() {
            let model = MockChatModel::new().with_response("It is sunny.");
            let stream = model.stream_complete(test_request()).await.unwrap();

            let (content, err) = collect(stream).await;
            assert_eq!(content, "It is sunny.");
            assert!(err.is_none());
        }

        #[tokio::test]
        async fn configured_error_fails_before_streaming() {
            let model = MockChatModel::new().with_error(AIError::AuthenticationFailed);
            let result = model.stream_complete(test_request()).await;
            assert!(matches!(result, Err(AIError::AuthenticationFailed)));
        }

        #[tokio::test]
        async fn mid_stream_error_follows_partial_output() {
            let model = MockChatModel::new()
                .with_mid_stream_error("It is", AIError::network("connection reset"));
            let stream = model.stream_complete(test_request()).await.unwrap();

            let (content, err) = collect(stream).await;
            assert_eq!(content, "It is");
            assert_eq!(err, Some(AIError::network("connection reset")));
        }

        #[tokio::test]
        async fn records_requests() {
            let model = MockChatModel::new();
            model.complete(test_request()).await.unwrap();
            assert_eq!(model.get_calls()[0].messages[0].content, "Hello");
        }
    }

    mod embeddings {
        use super::*;

        #[tokio::test]
        async fn documents_keep_input_order() {
            let embeddings = MockEmbeddings::new();
            let docs = vec!["aaa".to_string(), "bbb".to_string()];
            let vectors = embeddings.embed_documents(&docs).await.unwrap();

            assert_eq!(vectors[0][0], 3.0);
            assert_eq!(vectors[1][1], 3.0);
            assert_eq!(embeddings.call_count(), 1);
        }

        #[tokio::test]
        async fn failing_mock_returns_error() {
            let embeddings = MockEmbeddings::failing(AIError::unavailable("down"));
            assert!(embeddings.embed_query("q").await.is_err());
        }
    }
}
