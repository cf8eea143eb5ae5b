//! Server → client frames.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::SourceRef;
use crate::domain::foundation::RequestId;

/// All frame types the server sends.
///
/// Every request-scoped frame carries the `messageId` of the request it
/// belongs to, so frames of concurrent requests can share one connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum OutboundFrame {
    /// Incremental fragment of the answer.
    #[serde(rename = "message")]
    MessageDelta {
        #[serde(rename = "messageId")]
        request_id: RequestId,
        #[serde(rename = "data")]
        text: String,
    },

    /// Citations for the answer. At most once per request.
    #[serde(rename = "sources")]
    Sources {
        #[serde(rename = "messageId")]
        request_id: RequestId,
        #[serde(rename = "data")]
        sources: Vec<SourceRef>,
    },

    /// The answer is complete. Terminal.
    #[serde(rename = "messageEnd")]
    StreamEnd {
        #[serde(rename = "messageId")]
        request_id: RequestId,
    },

    /// Terminal for the request when `request_id` is set; otherwise a
    /// connection-level protocol error.
    #[serde(rename = "error")]
    Error {
        #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
        request_id: Option<RequestId>,
        #[serde(rename = "data")]
        message: String,
    },
}

impl OutboundFrame {
    /// Creates an answer fragment frame.
    pub fn delta(request_id: RequestId, text: impl Into<String>) -> Self {
        OutboundFrame::MessageDelta {
            request_id,
            text: text.into(),
        }
    }

    /// Creates a sources frame.
    pub fn sources(request_id: RequestId, sources: Vec<SourceRef>) -> Self {
        OutboundFrame::Sources {
            request_id,
            sources,
        }
    }

    /// Creates the terminal success frame.
    pub fn stream_end(request_id: RequestId) -> Self {
        OutboundFrame::StreamEnd { request_id }
    }

    /// Creates a terminal error frame for one request.
    pub fn request_error(request_id: RequestId, message: impl Into<String>) -> Self {
        OutboundFrame::Error {
            request_id: Some(request_id),
            message: message.into(),
        }
    }

    /// Creates a connection-level error frame.
    pub fn connection_error(message: impl Into<String>) -> Self {
        OutboundFrame::Error {
            request_id: None,
            message: message.into(),
        }
    }

    /// The request this frame belongs to, if any.
    pub fn request_id(&self) -> Option<&RequestId> {
        match self {
            OutboundFrame::MessageDelta { request_id, .. }
            | OutboundFrame::Sources { request_id, .. }
            | OutboundFrame::StreamEnd { request_id } => Some(request_id),
            OutboundFrame::Error { request_id, .. } => request_id.as_ref(),
        }
    }

    /// True if no further frames follow for this frame's request.
    pub fn is_terminal(&self) -> bool {
        match self {
            OutboundFrame::StreamEnd { .. } => true,
            OutboundFrame::Error { request_id, .. } => request_id.is_some(),
            _ => false,
        }
    }

    /// Short label used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundFrame::MessageDelta { .. } => "message",
            OutboundFrame::Sources { .. } => "sources",
            OutboundFrame::StreamEnd { .. } => "messageEnd",
            OutboundFrame::Error { .. } => "error",
        }
    }

    /// Serializes the frame to its JSON text form.
    pub fn encode(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a frame received from the server.
    pub fn decode(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}
