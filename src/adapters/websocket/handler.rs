//! WebSocket upgrade handler and connection lifecycle.
//!
//! 1. Upgrade to WebSocket
//! 2. Open a session with its outbound queue
//! 3. Route inbound frames until the client disconnects
//! 4. Cancel in-flight requests and wait for their bridges

use std::sync::Arc;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::application::{ConnectionSession, RequestRouter};
use crate::domain::foundation::ConnectionId;
use crate::domain::protocol::OutboundFrame;

/// State required for WebSocket handling.
#[derive(Clone)]
pub struct WebSocketState {
    pub router: RequestRouter,
    /// Frames queued per connection before bridges wait.
    pub outbound_buffer: usize,
}

impl WebSocketState {
    pub fn new(router: RequestRouter, outbound_buffer: usize) -> Self {
        Self {
            router,
            outbound_buffer,
        }
    }
}

/// Handle WebSocket upgrade requests.
///
/// Route: `GET /ws`
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<WebSocketState>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

/// Runs one connection until either side goes away.
async fn handle_socket(socket: WebSocket, state: WebSocketState) {
    let (sender, mut receiver) = socket.split();
    let (session, outbound) = ConnectionSession::channel(state.outbound_buffer);
    let session = Arc::new(session);
    let connection_id = session.connection_id();

    tracing::info!(connection_id = %connection_id, "WebSocket connection established");

    let mut send_task = tokio::spawn(write_frames(sender, outbound, connection_id));

    let router = state.router.clone();
    let reader_session = session.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(result) = receiver.next().await {
            match result {
                Ok(Message::Text(text)) => {
                    let _ = router.route(&text, &reader_session).await;
                }
                Ok(Message::Binary(bytes)) => {
                    let _ = router.route_binary(&bytes, &reader_session).await;
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                    // Answered by axum
                }
                Ok(Message::Close(_)) => {
                    tracing::debug!(connection_id = %connection_id, "Client sent close frame");
                    break;
                }
                Err(e) => {
                    tracing::debug!(connection_id = %connection_id, "Receive error: {}", e);
                    break;
                }
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => {
            recv_task.abort();
        }
        _ = &mut recv_task => {}
    }

    session.close().await;
    send_task.abort();

    tracing::info!(
        connection_id = %connection_id,
        requests = session.requests_started(),
        "WebSocket connection closed"
    );
}

/// Drains the session queue into the socket.
async fn write_frames(
    mut sender: SplitSink<WebSocket, Message>,
    mut outbound: mpsc::Receiver<OutboundFrame>,
    connection_id: ConnectionId,
) {
    while let Some(frame) = outbound.recv().await {
        let json = match frame.encode() {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(connection_id = %connection_id, kind = frame.kind(), "Failed to encode frame: {}", e);
                continue;
            }
        };
        if let Err(e) = sender.send(Message::Text(json)).await {
            tracing::debug!(connection_id = %connection_id, "Send error, closing connection: {}", e);
            break;
        }
    }
}

/// Router exposing the WebSocket endpoint.
pub fn websocket_router() -> axum::Router<WebSocketState> {
    use axum::routing::get;

    axum::Router::new().route("/ws", get(ws_handler))
}
