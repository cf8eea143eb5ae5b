//! Default focus-mode handlers.
//!
//! - [`SearchAnswerHandler`] - search, rerank, cite, answer (all search modes)
//! - [`WritingAssistantHandler`] - model-only answers
//! - [`ScriptedHandler`] - deterministic replay for tests and demos
//!
//! [`default_registry`] wires one handler per focus mode.

mod emitter;
mod prompts;
mod rerank;
mod scripted;
mod search_answer;
mod writing_assistant;

use std::sync::Arc;

use crate::application::streaming::HandlerRegistry;
use crate::domain::conversation::FocusMode;
use crate::ports::SearchEngine;

pub use emitter::GENERIC_FAILURE;
pub use rerank::{cosine_similarity, rank_by_similarity};
pub use scripted::ScriptedHandler;
pub use search_answer::{AnswerSettings, SearchAnswerHandler, SearchProfile};
pub use writing_assistant::WritingAssistantHandler;

/// Registry with the default handler for every focus mode.
pub fn default_registry(search: Arc<dyn SearchEngine>, settings: AnswerSettings) -> HandlerRegistry {
    FocusMode::all()
        .iter()
        .fold(HandlerRegistry::builder(), |builder, mode| {
            match SearchProfile::for_mode(*mode) {
                Some(profile) => builder.register(
                    *mode,
                    Arc::new(
                        SearchAnswerHandler::new(profile, Arc::clone(&search)).with_settings(settings),
                    ),
                ),
                None => builder.register(*mode, Arc::new(WritingAssistantHandler::new())),
            }
        })
        .build()
}
