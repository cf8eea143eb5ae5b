//! Request plumbing shared by the OpenAI-compatible adapters.
//!
//! OpenAI, Groq and Ollama (`/v1`) accept the same chat and embeddings
//! payloads, return the same error statuses and stream completions as
//! Server-Sent Events.

use reqwest::{RequestBuilder, Response};
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::ports::{AIError, CompletionRequest, FinishReason, MessageRole, StreamChunk};

const DEFAULT_RETRY_AFTER_SECS: u32 = 30;

/// Adds the bearer header when a key is present.
pub(super) fn authorize(builder: RequestBuilder, api_key: Option<&Secret<String>>) -> RequestBuilder {
    match api_key {
        Some(key) => builder.bearer_auth(key.expose_secret()),
        None => builder,
    }
}

/// Maps a transport failure.
pub(super) fn send_error(err: reqwest::Error, timeout: Duration) -> AIError {
    if err.is_timeout() {
        AIError::Timeout {
            timeout_secs: u32::try_from(timeout.as_secs()).unwrap_or(u32::MAX),
        }
    } else if err.is_connect() {
        AIError::network(format!("Connection failed: {}", err))
    } else {
        AIError::network(err.to_string())
    }
}

/// Passes successful responses through and maps error statuses.
pub(super) async fn check_status(response: Response) -> Result<Response, AIError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();

    match status.as_u16() {
        401 | 403 => Err(AIError::AuthenticationFailed),
        429 => Err(AIError::rate_limited(parse_retry_after(&error_body))),
        400 | 404 | 422 => Err(AIError::InvalidRequest(error_body)),
        500..=599 => Err(AIError::unavailable(format!(
            "Server error {}: {}",
            status, error_body
        ))),
        _ => Err(AIError::network(format!(
            "Unexpected status {}: {}",
            status, error_body
        ))),
    }
}

/// Extracts "try again in Ns" from an error body, defaulting to 30 seconds.
pub(super) fn parse_retry_after(error_body: &str) -> u32 {
    let message = serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|v| v.pointer("/error/message").and_then(|m| m.as_str()).map(str::to_owned));

    message
        .as_deref()
        .and_then(|s| s.split("try again in ").nth(1))
        .and_then(|rest| {
            let digits: String = rest.chars().take_while(char::is_ascii_digit).collect();
            digits.parse().ok()
        })
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Incremental SSE decoder for chat completion streams.
///
/// Network chunks do not respect line boundaries, so partial lines are held
/// until their newline arrives.
#[derive(Debug, Default)]
pub(super) struct SseDecoder {
    pending: Vec<u8>,
    done: bool,
}

impl SseDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// True once `data: [DONE]` has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Feeds raw bytes and returns the chunks completed by them.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Result<StreamChunk, AIError>> {
        self.pending.extend_from_slice(bytes);

        let mut results = Vec::new();
        while let Some(newline) = self.pending.iter().position(|b| *b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=newline).collect();
            let line = String::from_utf8_lossy(&line);
            if let Some(result) = self.decode_line(line.trim_end_matches(['\r', '\n'])) {
                results.push(result);
            }
        }
        results
    }

    fn decode_line(&mut self, line: &str) -> Option<Result<StreamChunk, AIError>> {
        if self.done {
            return None;
        }
        let data = line.strip_prefix("data:")?.trim_start();
        if data == "[DONE]" {
            self.done = true;
            return None;
        }
        if data.is_empty() {
            return None;
        }

        match serde_json::from_str::<StreamResponseChunk>(data) {
            Ok(chunk) => {
                let choice = chunk.choices.into_iter().next()?;
                if let Some(reason) = choice.finish_reason {
                    return Some(Ok(StreamChunk {
                        delta: choice.delta.content.unwrap_or_default(),
                        finish_reason: Some(FinishReason::from_provider(&reason)),
                    }));
                }
                choice
                    .delta
                    .content
                    .filter(|content| !content.is_empty())
                    .map(|content| Ok(StreamChunk::content(content)))
            }
            Err(e) => Some(Err(AIError::parse(format!(
                "Failed to parse SSE chunk: {}",
                e
            )))),
        }
    }
}

// ----- Wire Types -----

#[derive(Debug, Serialize)]
pub(super) struct ChatRequest {
    pub model: String,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    pub temperature: f32,
    pub stream: bool,
}

impl ChatRequest {
    pub fn build(model: &str, default_temperature: f32, request: &CompletionRequest, stream: bool) -> Self {
        let system = request
            .system_prompt
            .as_ref()
            .map(|prompt| WireMessage::new(MessageRole::System, prompt));
        let messages = system
            .into_iter()
            .chain(request.messages.iter().map(|m| WireMessage::new(m.role, &m.content)))
            .collect();

        Self {
            model: model.to_string(),
            messages,
            max_tokens: request.max_tokens,
            temperature: request.temperature.unwrap_or(default_temperature),
            stream,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub(super) struct WireMessage {
    pub role: MessageRole,
    pub content: String,
}

impl WireMessage {
    fn new(role: MessageRole, content: &str) -> Self {
        Self {
            role,
            content: content.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatResponse {
    pub model: String,
    pub choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
pub(super) struct ChatChoice {
    pub message: WireMessage,
    pub finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamResponseChunk {
    choices: Vec<StreamChoice>,
}

#[derive(Debug, Deserialize)]
struct StreamChoice {
    delta: StreamDelta,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct StreamDelta {
    content: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct EmbeddingsRequest<'a> {
    pub model: &'a str,
    pub input: &'a [String],
}

#[derive(Debug, Deserialize)]
pub(super) struct EmbeddingsResponse {
    pub data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
pub(super) struct EmbeddingData {
    pub index: usize,
    pub embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::Message;

    fn deltas(results: Vec<Result<StreamChunk, AIError>>) -> Vec<String> {
        results.into_iter().map(|r| r.unwrap().delta).collect()
    }

    mod sse {
        use super::*;

        #[test]
        fn content_chunk() {
            let mut decoder = SseDecoder::new();
            let data = "data: {\"id\":\"c1\",\"choices\":[{\"delta\":{\"content\":\"Hello\"},\"finish_reason\":null}]}\n\n";
            let chunks = decoder.push(data.as_bytes());

            assert_eq!(chunks.len(), 1);
            let chunk = chunks[0].as_ref().unwrap();
            assert_eq!(chunk.delta, "Hello");
            assert!(!chunk.is_final());
        }

        #[test]
        fn final_chunk_carries_finish_reason() {
            let mut decoder = SseDecoder::new();
            let data = "data: {\"choices\":[{\"delta\":{},\"finish_reason\":\"stop\"}]}\n";
            let chunks = decoder.push(data.as_bytes());

            let chunk = chunks[0].as_ref().unwrap();
            assert!(chunk.is_final());
            assert_eq!(chunk.finish_reason, Some(FinishReason::Stop));
        }

        #[test]
        fn line_split_across_network_chunks() {
            let mut decoder = SseDecoder::new();
            let line = "data: {\"choices\":[{\"delta\":{\"content\":\"sunny\"},\"finish_reason\":null}]}\n";
            let (head, tail) = line.split_at(20);

            assert!(decoder.push(head.as_bytes()).is_empty());
            assert_eq!(deltas(decoder.push(tail.as_bytes())), vec!["sunny"]);
        }

        #[test]
        fn multibyte_character_split_across_chunks() {
            let mut decoder = SseDecoder::new();
            let line = "data: {\"choices\":[{\"delta\":{\"content\":\"café\"},\"finish_reason\":null}]}\n";
            let bytes = line.as_bytes();
            let split = line.find('é').unwrap() + 1;

            assert!(decoder.push(&bytes[..split]).is_empty());
            assert_eq!(deltas(decoder.push(&bytes[split..])), vec!["café"]);
        }

        #[test]
        fn done_marker_stops_decoding() {
            let mut decoder = SseDecoder::new();
            let data = "data: [DONE]\n\ndata: {\"choices\":[{\"delta\":{\"content\":\"late\"}}]}\n";
            assert!(decoder.push(data.as_bytes()).is_empty());
            assert!(decoder.is_done());
        }

        #[test]
        fn comments_and_crlf_are_tolerated() {
            let mut decoder = SseDecoder::new();
            let data = ": keep-alive\r\ndata: {\"choices\":[{\"delta\":{\"content\":\"ok\"},\"finish_reason\":null}]}\r\n";
            assert_eq!(deltas(decoder.push(data.as_bytes())), vec!["ok"]);
        }

        #[test]
        fn malformed_json_is_a_parse_error() {
            let mut decoder = SseDecoder::new();
            let chunks = decoder.push(b"data: {not json}\n");
            assert!(matches!(chunks[0], Err(AIError::Parse(_))));
        }
    }

    mod retry_after {
        use super::*;

        #[test]
        fn parsed_from_message() {
            let error = r#"{"error":{"message":"Rate limit exceeded. Please try again in 12s."}}"#;
            assert_eq!(parse_retry_after(error), 12);
        }

        #[test]
        fn defaults_when_absent() {
            assert_eq!(parse_retry_after(r#"{"error":{"message":"Slow down"}}"#), 30);
            assert_eq!(parse_retry_after("not json"), 30);
        }
    }

    #[test]
    fn chat_request_puts_system_prompt_first() {
        let request = CompletionRequest::new()
            .with_system_prompt("be brief")
            .with_message(MessageRole::User, "hi");
        let wire = ChatRequest::build("gpt-4", 0.7, &request, true);

        assert_eq!(wire.messages[0].role, MessageRole::System);
        assert_eq!(wire.messages[1].content, "hi");
        assert_eq!(wire.temperature, 0.7);

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["stream"], true);
        assert!(json.get("max_tokens").is_none());
    }

    #[test]
    fn request_temperature_overrides_default() {
        let mut request = CompletionRequest::new().with_temperature(0.1);
        request.messages.push(Message::user("hi"));
        assert_eq!(ChatRequest::build("m", 0.7, &request, false).temperature, 0.1);
    }
}
