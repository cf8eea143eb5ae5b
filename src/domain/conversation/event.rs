//! Events a focus handler emits while answering.

use super::SourceRef;

/// One item of a handler's answer stream.
///
/// The stream ends normally by completing; `Error` is terminal and nothing
/// after it is forwarded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerEvent {
    /// Incremental fragment of the answer text.
    AnswerToken(String),
    /// Documents the answer is grounded on. Expected at most once.
    Sources(Vec<SourceRef>),
    /// The handler failed; the message is shown to the client.
    Error(String),
}

impl HandlerEvent {
    /// Creates an answer token event.
    pub fn token(text: impl Into<String>) -> Self {
        HandlerEvent::AnswerToken(text.into())
    }

    /// Creates an error event.
    pub fn error(message: impl Into<String>) -> Self {
        HandlerEvent::Error(message.into())
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            HandlerEvent::AnswerToken(_) => "answer-token",
            HandlerEvent::Sources(_) => "sources",
            HandlerEvent::Error(_) => "error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_labels_match_event_contract() {
        assert_eq!(HandlerEvent::token("a").kind(), "answer-token");
        assert_eq!(HandlerEvent::Sources(vec![]).kind(), "sources");
        assert_eq!(HandlerEvent::error("boom").kind(), "error");
    }
}
