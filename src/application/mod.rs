//! Application layer - request routing, streaming and focus handlers.
//!
//! - `streaming` - router, bridge, registry and per-connection session
//! - `focus_handlers` - default answer strategies behind the `FocusHandler` port

pub mod focus_handlers;
pub mod streaming;

pub use streaming::{
    BridgeOutcome, ConnectionSession, HandlerRegistry, RequestRouter, StreamLimits,
};
