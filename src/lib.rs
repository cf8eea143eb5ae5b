//! Focus Relay - streaming answer relay.
//!
//! Clients send a question with a focus mode over a persistent WebSocket
//! connection. The relay routes it to the handler registered for that mode
//! and multiplexes the handler's answer fragments, sources and completion
//! back as request-scoped frames.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
