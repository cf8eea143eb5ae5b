//! WebSocket client for the streaming protocol.

mod ws_client;

pub use ws_client::{ChatSession, ClientError, Exchange, StreamingClient};
