//! Focus Handler Port - the answer strategy behind a focus mode.
//!
//! A handler turns a query plus history into a lazy stream of
//! [`HandlerEvent`]s. The stream ends by completing; an `Error` event is
//! terminal. Handlers must stop producing when the invocation's
//! cancellation token fires or the stream is dropped.

use futures::Stream;
use std::pin::Pin;
use tokio_util::sync::CancellationToken;

use crate::domain::conversation::{ChatRole, ChatTurn, HandlerEvent};

use super::chat_model::ChatModelRef;
use super::embeddings::EmbeddingsRef;

/// Event stream returned by a handler.
pub type HandlerEventStream = Pin<Box<dyn Stream<Item = HandlerEvent> + Send>>;

/// Everything a handler receives for one request.
#[derive(Clone)]
pub struct HandlerInvocation {
    pub query: String,
    /// Conversation as sent by the client, oldest first. Clients usually
    /// end it with the current question.
    pub history: Vec<ChatTurn>,
    pub chat_model: ChatModelRef,
    pub embeddings: EmbeddingsRef,
    /// Site restriction, only set for domain-scoped modes.
    pub domain: Option<String>,
    pub cancellation: CancellationToken,
}

impl HandlerInvocation {
    /// Turns before the current question.
    ///
    /// Drops a trailing human turn repeating `query`.
    pub fn prior_history(&self) -> &[ChatTurn] {
        match self.history.split_last() {
            Some((last, rest)) if last.role() == ChatRole::Human && last.text() == self.query => rest,
            _ => &self.history,
        }
    }
}

impl std::fmt::Debug for HandlerInvocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HandlerInvocation")
            .field("query", &self.query)
            .field("history_len", &self.history.len())
            .field("chat_model", &self.chat_model.provider_info())
            .field("domain", &self.domain)
            .finish()
    }
}

/// Port for focus-mode answer strategies.
pub trait FocusHandler: Send + Sync {
    /// Starts answering. Must not block; work happens as the stream is polled
    /// or on tasks the handler spawns.
    fn invoke(&self, invocation: HandlerInvocation) -> HandlerEventStream;

    /// Name used in logs.
    fn name(&self) -> &'static str;
}
