//! Prompt templates for the default focus handlers.

use crate::domain::conversation::ChatTurn;
use crate::ports::SearchHit;

/// Reply the rephraser gives when no search is needed.
pub const NO_SEARCH_NEEDED: &str = "not_needed";

const REPHRASE_PROMPT: &str = "\
You will be given a conversation and a follow-up question. Rephrase the \
follow-up question so it is a standalone search query that can be understood \
without the conversation. If the input is a greeting or a writing task that \
needs no search, reply with `not_needed` and nothing else. Reply with the \
query only.";

/// Instructions for turning history + follow-up into a search query.
pub fn rephrase_system_prompt() -> &'static str {
    REPHRASE_PROMPT
}

/// Renders history and the follow-up as a single rephrasing input.
pub fn rephrase_input(history: &[ChatTurn], question: &str) -> String {
    let mut input = String::from("Conversation:\n");
    for turn in history {
        input.push_str(turn.role().as_str());
        input.push_str(": ");
        input.push_str(turn.text());
        input.push('\n');
    }
    input.push_str("\nFollow up question: ");
    input.push_str(question);
    input
}

/// Numbered context block; numbers match the order of emitted sources.
pub fn numbered_context(hits: &[SearchHit]) -> String {
    hits.iter()
        .enumerate()
        .map(|(i, hit)| format!("{}. {}\n{}", i + 1, hit.title, hit.page_content()))
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full system prompt for a grounded answer.
pub fn answer_system_prompt(persona: &str, context: &str, today: &str) -> String {
    format!(
        "{persona}\n\n\
         Use the numbered context below to answer. Cite sources inline with \
         their number in brackets, like [1]. If the context does not contain \
         the answer, say so instead of guessing. Format the answer in markdown.\n\n\
         <context>\n{context}\n</context>\n\n\
         Current date: {today}"
    )
}

pub const WEB_SEARCH_PERSONA: &str =
    "You are an AI model expert at searching the web and answering queries.";

pub const ACADEMIC_SEARCH_PERSONA: &str =
    "You are an AI model expert at finding and summarising academic papers and articles.";

pub const WOLFRAM_ALPHA_PERSONA: &str =
    "You are an AI model expert at answering computational and factual queries with Wolfram Alpha.";

pub const YOUTUBE_SEARCH_PERSONA: &str =
    "You are an AI model expert at finding and summarising YouTube videos.";

pub const REDDIT_SEARCH_PERSONA: &str =
    "You are an AI model expert at finding opinions and discussions on Reddit.";

pub const WRITING_ASSISTANT_PROMPT: &str = "\
You are a writing assistant. Help the user write, edit and improve text. You \
do not search the web; if the user needs facts you cannot know, tell them to \
switch to a search focus mode.";
