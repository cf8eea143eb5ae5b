//! Protocol-level rejections detected before any handler runs.

use thiserror::Error;

use crate::domain::foundation::ValidationError;

/// Reasons the router refuses an inbound frame.
///
/// Both are reported as a connection-scoped error frame; the connection stays
/// open for further requests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtocolError {
    /// The frame is not valid JSON, has the wrong shape, or fails validation.
    #[error("malformed request: {0}")]
    MalformedRequest(String),

    /// No handler is registered for the requested focus mode.
    #[error("unknown focus mode '{0}'")]
    UnknownFocusMode(String),
}

impl ProtocolError {
    /// Creates a malformed request error.
    pub fn malformed(reason: impl Into<String>) -> Self {
        ProtocolError::MalformedRequest(reason.into())
    }

    /// Text placed in the connection-level error frame.
    ///
    /// The detailed reason only goes to the log.
    pub fn client_message(&self) -> &'static str {
        match self {
            ProtocolError::MalformedRequest(_) => "Invalid message format",
            ProtocolError::UnknownFocusMode(_) => "Invalid focus mode",
        }
    }
}

impl From<ValidationError> for ProtocolError {
    fn from(err: ValidationError) -> Self {
        ProtocolError::MalformedRequest(err.to_string())
    }
}

impl From<serde_json::Error> for ProtocolError {
    fn from(err: serde_json::Error) -> Self {
        ProtocolError::MalformedRequest(err.to_string())
    }
}
