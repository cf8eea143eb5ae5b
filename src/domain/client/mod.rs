//! Client module - rebuilds a conversation from streamed frames.
//!
//! [`ChatClient`] is a pure state machine: it never touches a socket. Transport
//! adapters feed it decoded frames and send the requests it returns.

mod state_machine;
mod transcript;

pub use state_machine::{ChatClient, ClientUpdate};
pub use transcript::{EntryRole, TranscriptEntry};
