//! Conversation module - the vocabulary shared by handlers and clients.
//!
//! - [`ChatTurn`] / [`ChatRole`]: history entries supplied with every request
//! - [`SourceRef`]: citations a handler attaches to its answer
//! - [`HandlerEvent`]: the typed event stream a handler produces
//! - [`FocusMode`]: which answer strategy the client selected

mod event;
mod focus_mode;
mod source;
mod turn;

pub use event::HandlerEvent;
pub use focus_mode::FocusMode;
pub use source::SourceRef;
pub use turn::{ChatRole, ChatTurn};
