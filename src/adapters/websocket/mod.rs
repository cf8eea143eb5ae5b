//! WebSocket transport for the streaming protocol.
//!
//! Each connection gets a [`ConnectionSession`]: inbound text frames go to the
//! [`RequestRouter`], outbound frames are drained from the session queue by a
//! writer task. Closing the socket cancels every in-flight request.
//!
//! [`ConnectionSession`]: crate::application::ConnectionSession
//! [`RequestRouter`]: crate::application::RequestRouter

mod handler;

pub use handler::{websocket_router, ws_handler, WebSocketState};
