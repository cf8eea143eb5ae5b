//! Transcript entries: what a client shows for each turn.

use serde::{Deserialize, Serialize};

use crate::domain::conversation::SourceRef;
use crate::domain::foundation::{EntryId, Timestamp};

/// Who an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryRole {
    User,
    Assistant,
}

/// One displayed turn.
///
/// # Invariants
///
/// - `text` only grows while the owning request streams
/// - `created_at` is set at construction and never changes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    id: EntryId,
    role: EntryRole,
    text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    sources: Option<Vec<SourceRef>>,
    created_at: Timestamp,
}

impl TranscriptEntry {
    /// Creates a user entry with a fresh id.
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            id: EntryId::generate(),
            role: EntryRole::User,
            text: text.into(),
            sources: None,
            created_at: Timestamp::now(),
        }
    }

    /// Creates an empty assistant entry with a fresh id.
    pub fn assistant() -> Self {
        Self {
            id: EntryId::generate(),
            role: EntryRole::Assistant,
            text: String::new(),
            sources: None,
            created_at: Timestamp::now(),
        }
    }

    pub fn id(&self) -> &EntryId {
        &self.id
    }

    pub fn role(&self) -> EntryRole {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sources(&self) -> Option<&[SourceRef]> {
        self.sources.as_deref()
    }

    pub fn created_at(&self) -> Timestamp {
        self.created_at
    }

    pub(super) fn append(&mut self, fragment: &str) {
        self.text.push_str(fragment);
    }

    pub(super) fn attach_sources(&mut self, sources: Vec<SourceRef>) {
        self.sources = Some(sources);
    }
}
