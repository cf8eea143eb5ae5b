//! Chat model for OpenAI-compatible APIs.
//!
//! Serves OpenAI, Groq and Ollama: all three expose `/chat/completions` with
//! the same payload and stream responses as Server-Sent Events.
//!
//! # Configuration
//!
//! ```ignore
//! let config = OpenAiCompatibleConfig::openai(api_key).with_model("gpt-4");
//! let model = OpenAiCompatibleChatModel::new(config)?;
//! ```
//!
//! # Timeouts
//!
//! One-shot completions carry the configured request timeout and are retried
//! with exponential backoff. Streams are bounded only by the connect timeout;
//! the streaming bridge enforces idle and overall limits.

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use reqwest::{Client, Response};
use secrecy::Secret;
use std::time::Duration;
use tokio::time::sleep;

use super::wire::{self, ChatRequest, ChatResponse, SseDecoder};
use crate::config::ModelProvider;
use crate::ports::{
    AIError, ChatModel, ChunkStream, CompletionRequest, CompletionResponse, FinishReason,
    ProviderInfo,
};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
pub const GROQ_BASE_URL: &str = "https://api.groq.com/openai/v1";

const DEFAULT_TEMPERATURE: f32 = 0.7;

/// Base URL of the OpenAI-compatible API for `endpoint` (Ollama's server root).
pub fn ollama_base_url(endpoint: &str) -> String {
    format!("{}/v1", endpoint.trim_end_matches('/'))
}

/// Configuration for an OpenAI-compatible chat model.
#[derive(Debug, Clone)]
pub struct OpenAiCompatibleConfig {
    pub provider: ModelProvider,
    /// Bearer token; Ollama runs without one.
    api_key: Option<Secret<String>>,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub temperature: f32,
}

impl OpenAiCompatibleConfig {
    fn base(provider: ModelProvider, api_key: Option<Secret<String>>, base_url: String, model: &str) -> Self {
        Self {
            provider,
            api_key,
            model: model.to_string(),
            base_url,
            timeout: Duration::from_secs(120),
            max_retries: 3,
            temperature: DEFAULT_TEMPERATURE,
        }
    }

    pub fn openai(api_key: Secret<String>) -> Self {
        Self::base(
            ModelProvider::OpenAI,
            Some(api_key),
            OPENAI_BASE_URL.to_string(),
            "gpt-3.5-turbo",
        )
    }

    pub fn groq(api_key: Secret<String>) -> Self {
        Self::base(
            ModelProvider::Groq,
            Some(api_key),
            GROQ_BASE_URL.to_string(),
            "llama3-70b-8192",
        )
    }

    /// `endpoint` is the Ollama server root, e.g. `http://localhost:11434`.
    pub fn ollama(endpoint: &str) -> Self {
        Self::base(ModelProvider::Ollama, None, ollama_base_url(endpoint), "llama3")
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub(super) fn api_key(&self) -> Option<&Secret<String>> {
        self.api_key.as_ref()
    }
}

/// Builds the HTTP client shared by the OpenAI-compatible adapters.
pub(super) fn http_client(timeout: Duration) -> Result<Client, AIError> {
    Client::builder()
        .connect_timeout(timeout)
        .build()
        .map_err(|e| AIError::network(format!("Failed to create HTTP client: {}", e)))
}

/// OpenAI-compatible chat model.
pub struct OpenAiCompatibleChatModel {
    config: OpenAiCompatibleConfig,
    client: Client,
}

impl OpenAiCompatibleChatModel {
    pub fn new(config: OpenAiCompatibleConfig) -> Result<Self, AIError> {
        let client = http_client(config.timeout)?;
        Ok(Self { config, client })
    }

    pub fn config(&self) -> &OpenAiCompatibleConfig {
        &self.config
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    async fn send(&self, request: &CompletionRequest, stream: bool) -> Result<Response, AIError> {
        let body = ChatRequest::build(&self.config.model, self.config.temperature, request, stream);
        let mut builder = self.client.post(self.completions_url()).json(&body);
        if !stream {
            builder = builder.timeout(self.config.timeout);
        }

        let response = wire::authorize(builder, self.config.api_key())
            .send()
            .await
            .map_err(|e| wire::send_error(e, self.config.timeout))?;
        wire::check_status(response).await
    }

    async fn complete_once(&self, request: &CompletionRequest) -> Result<CompletionResponse, AIError> {
        let response = self.send(request, false).await?;
        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse response: {}", e)))?;

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| AIError::parse("No choices in response"))?;

        Ok(CompletionResponse {
            content: choice.message.content,
            model: body.model,
            finish_reason: choice
                .finish_reason
                .as_deref()
                .map(FinishReason::from_provider)
                .unwrap_or(FinishReason::Stop),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiCompatibleChatModel {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, AIError> {
        let mut attempt = 0;
        loop {
            match self.complete_once(&request).await {
                Ok(completion) => return Ok(completion),
                Err(err) if !err.is_retryable() || attempt >= self.config.max_retries => {
                    return Err(err)
                }
                Err(err) => {
                    // Exponential backoff: 1s, 2s, 4s, ...
                    let delay = Duration::from_secs(1 << attempt.min(6));
                    tracing::warn!(
                        error = %err,
                        provider = %self.config.provider,
                        attempt,
                        "completion failed, retrying in {:?}",
                        delay
                    );
                    sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    async fn stream_complete(&self, request: CompletionRequest) -> Result<ChunkStream, AIError> {
        let response = self.send(&request, true).await?;

        let stream = response
            .bytes_stream()
            .scan(SseDecoder::new(), |decoder, chunk| {
                let decoded = match chunk {
                    Ok(bytes) => decoder.push(&bytes),
                    Err(e) => vec![Err(AIError::network(format!("Stream error: {}", e)))],
                };
                futures::future::ready(Some(decoded))
            })
            .flat_map(stream::iter);

        Ok(Box::pin(stream))
    }

    fn provider_info(&self) -> ProviderInfo {
        ProviderInfo::new(self.config.provider.as_str(), &self.config.model)
    }
}
