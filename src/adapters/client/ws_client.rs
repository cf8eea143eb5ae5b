//! Client transport over tokio-tungstenite.
//!
//! [`StreamingClient`] moves frames; [`ChatSession`] feeds them through the
//! [`ChatClient`] state machine so callers see whole exchanges.

use futures::{SinkExt, StreamExt};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

use crate::domain::client::{ChatClient, ClientUpdate};
use crate::domain::conversation::SourceRef;
use crate::domain::foundation::{EntryId, RequestId};
use crate::domain::protocol::{InboundRequest, OutboundFrame};

/// Client-side failures.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("invalid frame: {0}")]
    InvalidFrame(#[from] serde_json::Error),

    #[error("connection closed by server")]
    Disconnected,

    #[error("a request is already in flight")]
    Busy,

    #[error("nothing to send")]
    NothingToSend,

    #[error("no answer to rewrite with that id")]
    NothingToRewrite,

    #[error("server rejected the request: {0}")]
    Rejected(String),

    #[error("request {request_id} failed: {message}")]
    RequestFailed { request_id: RequestId, message: String },
}

/// Raw frame transport.
pub struct StreamingClient {
    socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl StreamingClient {
    /// Connects to a relay, e.g. `ws://localhost:3001/ws`.
    pub async fn connect(url: &str) -> Result<Self, ClientError> {
        let (socket, _response) = connect_async(url).await?;
        tracing::debug!(url, "connected");
        Ok(Self { socket })
    }

    pub async fn send(&mut self, request: &InboundRequest) -> Result<(), ClientError> {
        self.send_raw(request.encode()?).await
    }

    /// Sends text as-is; lets tests exercise malformed frames.
    pub async fn send_raw(&mut self, text: impl Into<String>) -> Result<(), ClientError> {
        self.socket.send(Message::Text(text.into())).await?;
        Ok(())
    }

    /// Next server frame; `None` once the server closes the connection.
    pub async fn next_frame(&mut self) -> Result<Option<OutboundFrame>, ClientError> {
        while let Some(message) = self.socket.next().await {
            match message? {
                Message::Text(text) => return Ok(Some(OutboundFrame::decode(&text)?)),
                Message::Binary(bytes) => {
                    let text = String::from_utf8_lossy(&bytes);
                    return Ok(Some(OutboundFrame::decode(&text)?));
                }
                Message::Close(_) => return Ok(None),
                Message::Ping(_) | Message::Pong(_) | Message::Frame(_) => {}
            }
        }
        Ok(None)
    }

    pub async fn close(mut self) -> Result<(), ClientError> {
        self.socket.close(None).await?;
        Ok(())
    }
}

/// A completed question and answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Exchange {
    pub request_id: RequestId,
    pub answer: String,
    pub sources: Vec<SourceRef>,
}

/// Conversation driven over a [`StreamingClient`].
pub struct ChatSession {
    transport: StreamingClient,
    state: ChatClient,
}

impl ChatSession {
    pub fn new(transport: StreamingClient, state: ChatClient) -> Self {
        Self { transport, state }
    }

    pub async fn connect(url: &str, state: ChatClient) -> Result<Self, ClientError> {
        Ok(Self::new(StreamingClient::connect(url).await?, state))
    }

    pub fn state(&self) -> &ChatClient {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut ChatClient {
        &mut self.state
    }

    /// Submits `text` and waits for the whole answer.
    pub async fn ask(&mut self, text: &str) -> Result<Exchange, ClientError> {
        self.ask_with(text, |_| {}).await
    }

    /// Like [`ChatSession::ask`], reporting every update as it arrives.
    pub async fn ask_with<F>(&mut self, text: &str, on_update: F) -> Result<Exchange, ClientError>
    where
        F: FnMut(&ClientUpdate),
    {
        let request = match self.state.submit(text) {
            Some(request) => request,
            None if self.state.is_loading() => return Err(ClientError::Busy),
            None => return Err(ClientError::NothingToSend),
        };
        self.run(request, on_update).await
    }

    /// Discards the answer `entry_id` and asks its prompt again.
    pub async fn rewrite(&mut self, entry_id: &EntryId) -> Result<Exchange, ClientError> {
        self.rewrite_with(entry_id, |_| {}).await
    }

    pub async fn rewrite_with<F>(&mut self, entry_id: &EntryId, on_update: F) -> Result<Exchange, ClientError>
    where
        F: FnMut(&ClientUpdate),
    {
        let request = match self.state.rewrite(entry_id) {
            Some(request) => request,
            None if self.state.is_loading() => return Err(ClientError::Busy),
            None => return Err(ClientError::NothingToRewrite),
        };
        self.run(request, on_update).await
    }

    pub async fn close(self) -> Result<(), ClientError> {
        self.transport.close().await
    }

    async fn run<F>(&mut self, request: InboundRequest, on_update: F) -> Result<Exchange, ClientError>
    where
        F: FnMut(&ClientUpdate),
    {
        let result = self.exchange(request, on_update).await;
        if let Err(err) = &result {
            if self.state.abandon() {
                tracing::warn!(error = %err, "in-flight request abandoned");
            }
        }
        result
    }

    async fn exchange<F>(&mut self, request: InboundRequest, mut on_update: F) -> Result<Exchange, ClientError>
    where
        F: FnMut(&ClientUpdate),
    {
        self.transport.send(&request).await?;

        loop {
            let frame = self.transport.next_frame().await?.ok_or(ClientError::Disconnected)?;
            let update = self.state.handle_frame(frame);
            on_update(&update);

            match update {
                ClientUpdate::Completed {
                    request_id,
                    entry_id,
                    answer,
                } => {
                    let sources = entry_id
                        .map(|entry_id| self.sources_for(&entry_id))
                        .unwrap_or_default();
                    return Ok(Exchange {
                        request_id,
                        answer,
                        sources,
                    });
                }
                ClientUpdate::Failed {
                    request_id: Some(request_id),
                    message,
                } => return Err(ClientError::RequestFailed { request_id, message }),
                ClientUpdate::Failed {
                    request_id: None,
                    message,
                } => return Err(ClientError::Rejected(message)),
                ClientUpdate::ConnectionError { message } => {
                    tracing::warn!(%message, "connection-level error while waiting");
                }
                ClientUpdate::Ignored
                | ClientUpdate::SourcesAttached { .. }
                | ClientUpdate::TextAppended { .. } => {}
            }
        }
    }

    fn sources_for(&self, entry_id: &EntryId) -> Vec<SourceRef> {
        self.state
            .transcript()
            .iter()
            .find(|entry| entry.id() == entry_id)
            .and_then(|entry| entry.sources())
            .map(<[SourceRef]>::to_vec)
            .unwrap_or_default()
    }
}
