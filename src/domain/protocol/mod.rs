//! Protocol module - the frames exchanged over a streaming connection.
//!
//! - Client → Server: [`ClientFrame::Message`] carrying an [`InboundRequest`]
//! - Server → Client: [`OutboundFrame`] (`message`, `sources`, `messageEnd`, `error`)
//!
//! One JSON document per transport message, no batching.

mod errors;
mod inbound;
mod outbound;

pub use errors::ProtocolError;
pub use inbound::{ClientFrame, InboundRequest};
pub use outbound::OutboundFrame;
