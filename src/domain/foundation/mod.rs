//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps and the validation error type that form
//! the vocabulary of the streaming protocol.

mod errors;
mod ids;
mod timestamp;

pub use errors::ValidationError;
pub use ids::{ConnectionId, EntryId, RequestId, RequestIdSequence};
pub use timestamp::Timestamp;
