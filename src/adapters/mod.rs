//! Adapters - Implementations of port interfaces and transports.
//!
//! - `ai` - OpenAI-compatible chat and embedding models, model catalog, mocks
//! - `search` - SearxNG meta-search client
//! - `websocket` - server side of the streaming protocol
//! - `http` - axum application router (WebSocket, health, model listing)
//! - `client` - WebSocket client and conversation driver

pub mod ai;
pub mod client;
pub mod http;
pub mod search;
pub mod websocket;

pub use ai::{MockChatModel, MockEmbeddings, ModelCatalog};
pub use http::{app_router, AppState};
pub use search::SearxngClient;
pub use websocket::WebSocketState;
