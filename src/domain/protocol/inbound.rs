//! Client → server frames.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::ChatTurn;
use crate::domain::foundation::ValidationError;

use super::ProtocolError;

/// All frame types a client may send.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ClientFrame {
    /// Ask a question and stream the answer back.
    Message(InboundRequest),
}

impl ClientFrame {
    /// Serializes the frame to its JSON text form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// A question plus the history it should be answered against.
///
/// `focus_mode` stays a raw string here: resolving it is the registry's job,
/// and an unknown mode is a different failure from a malformed frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InboundRequest {
    pub content: String,
    pub focus_mode: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default)]
    pub history: Vec<ChatTurn>,
}

impl InboundRequest {
    /// Creates a request with no domain.
    pub fn new(
        content: impl Into<String>,
        focus_mode: impl Into<String>,
        history: Vec<ChatTurn>,
    ) -> Self {
        Self {
            content: content.into(),
            focus_mode: focus_mode.into(),
            domain: None,
            history,
        }
    }

    /// Sets the site restriction.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Parses and validates a raw text frame.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::MalformedRequest` when the text is not a
    /// `message` frame or its content is empty.
    pub fn parse(raw: &str) -> Result<Self, ProtocolError> {
        let ClientFrame::Message(request) = serde_json::from_str::<ClientFrame>(raw)?;
        request.validate()?;
        Ok(request)
    }

    /// Checks the shape rules that do not depend on the registry.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.content.is_empty() {
            return Err(ValidationError::empty_field("content"));
        }
        Ok(())
    }

    /// Returns the domain if it is present and not blank.
    pub fn domain(&self) -> Option<&str> {
        self.domain
            .as_deref()
            .map(str::trim)
            .filter(|d| !d.is_empty())
    }

    /// Wraps the request in its frame and serializes it.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        ClientFrame::Message(self.clone()).encode()
    }
}
