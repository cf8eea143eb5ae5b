//! Domain layer containing protocol types and conversation state.
//!
//! # Module Organization
//!
//! - `foundation` - Shared primitives (ids, timestamps, validation errors)
//! - `conversation` - Focus modes, chat turns, sources and handler events
//! - `protocol` - Frames exchanged over a streaming connection
//! - `client` - Client-side transcript state machine

pub mod client;
pub mod conversation;
pub mod foundation;
pub mod protocol;
