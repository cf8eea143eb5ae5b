//! Chat turns: the history entries exchanged with every request.
//!
//! Turns are immutable records of human/assistant exchanges. On the wire a
//! turn is a two-element array `["human", "text"]`.

use serde::{Deserialize, Serialize};

/// Who spoke a turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    /// The person asking.
    Human,
    /// The answering model.
    Assistant,
}

impl ChatRole {
    /// Wire identifier of this role.
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::Human => "human",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// One immutable turn of conversation history.
///
/// Serialized as a `[role, text]` tuple to match the wire format.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "(ChatRole, String)", into = "(ChatRole, String)")]
pub struct ChatTurn {
    role: ChatRole,
    text: String,
}

impl ChatTurn {
    /// Creates a turn.
    pub fn new(role: ChatRole, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
        }
    }

    /// Creates a human turn.
    pub fn human(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Human, text)
    }

    /// Creates an assistant turn.
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, text)
    }

    pub fn role(&self) -> ChatRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }
}

impl From<(ChatRole, String)> for ChatTurn {
    fn from((role, text): (ChatRole, String)) -> Self {
        Self { role, text }
    }
}

impl From<ChatTurn> for (ChatRole, String) {
    fn from(turn: ChatTurn) -> Self {
        (turn.role, turn.text)
    }
}
