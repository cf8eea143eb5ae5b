//! Writing assistant: answers from the model alone, no search.

use crate::ports::{
    CompletionRequest, FocusHandler, HandlerEventStream, HandlerInvocation, MessageRole,
};

use super::emitter::{spawn_producer, stream_answer};
use super::prompts::WRITING_ASSISTANT_PROMPT;

/// Handler for `writingAssistant`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WritingAssistantHandler;

impl WritingAssistantHandler {
    pub fn new() -> Self {
        Self
    }
}

impl FocusHandler for WritingAssistantHandler {
    fn invoke(&self, invocation: HandlerInvocation) -> HandlerEventStream {
        let cancellation = invocation.cancellation.clone();
        spawn_producer(cancellation, move |mut sink| async move {
            let request = CompletionRequest::new()
                .with_system_prompt(WRITING_ASSISTANT_PROMPT)
                .with_history(invocation.prior_history())
                .with_message(MessageRole::User, invocation.query.clone());
            let _ = stream_answer(&invocation.chat_model, request, &mut sink).await;
        })
    }

    fn name(&self) -> &'static str {
        "writing_assistant"
    }
}
