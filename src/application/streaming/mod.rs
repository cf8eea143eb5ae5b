//! Streaming module - multiplexes handler answers over one connection.
//!
//! ```text
//! inbound frame ──▶ RequestRouter ──▶ HandlerRegistry ──▶ FocusHandler
//!                        │                                    │
//!                        ▼                                    ▼ HandlerEvent stream
//!                 ConnectionSession ◀──── OutboundFrame ◀──── bridge
//! ```

mod bridge;
mod registry;
mod router;
mod session;

pub use bridge::{bridge, BridgeOutcome, BridgeReport, StreamLimits, TIMEOUT_MESSAGE};
pub use registry::{HandlerRegistry, HandlerRegistryBuilder};
pub use router::RequestRouter;
pub use session::{ConnectionSession, SessionClosed};
