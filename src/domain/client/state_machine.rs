//! Client-side conversation state machine.
//!
//! Consumes [`OutboundFrame`]s and rebuilds the transcript the user sees,
//! plus the `[role, text]` history sent with the next request. The machine is
//! transport-agnostic: [`ChatClient::submit`] and [`ChatClient::rewrite`]
//! return the request to send, and [`ChatClient::handle_frame`] reports what
//! changed.
//!
//! # Submission lifecycle
//!
//! ```text
//! idle ──submit──▶ pending (unbound) ──first frame──▶ pending (bound to id)
//!   ▲                    │                                   │
//!   └──── error ─────────┘◀──────── messageEnd / error ──────┘
//! ```
//!
//! Only one submission is in flight at a time, so the first frame carrying a
//! request id binds the pending submission to that id.

use crate::domain::conversation::{ChatTurn, FocusMode, SourceRef};
use crate::domain::foundation::{EntryId, RequestId};
use crate::domain::protocol::{InboundRequest, OutboundFrame};

use super::transcript::{EntryRole, TranscriptEntry};

/// What a frame did to the client state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientUpdate {
    /// The frame did not belong to the in-flight submission.
    Ignored,
    /// Sources were attached to the assistant entry.
    SourcesAttached { request_id: RequestId },
    /// A fragment was appended to the assistant entry.
    TextAppended { request_id: RequestId, text: String },
    /// The answer finished; history now includes the exchange.
    ///
    /// `entry_id` is `None` when the answer produced no frames before its end.
    Completed {
        request_id: RequestId,
        entry_id: Option<EntryId>,
        answer: String,
    },
    /// The in-flight submission failed. Partial output is kept.
    Failed {
        request_id: Option<RequestId>,
        message: String,
    },
    /// A connection-level error unrelated to the in-flight submission.
    ConnectionError { message: String },
}

impl ClientUpdate {
    /// True if the in-flight submission ended with this update.
    pub fn is_terminal(&self) -> bool {
        matches!(self, ClientUpdate::Completed { .. } | ClientUpdate::Failed { .. })
    }
}

#[derive(Debug, Clone)]
struct PendingSubmission {
    text: String,
    request_id: Option<RequestId>,
    entry_id: Option<EntryId>,
    answer: String,
}

/// Transcript and history for one conversation.
#[derive(Debug, Clone)]
pub struct ChatClient {
    focus_mode: FocusMode,
    domain: Option<String>,
    transcript: Vec<TranscriptEntry>,
    history: Vec<ChatTurn>,
    pending: Option<PendingSubmission>,
    response_appeared: bool,
}

impl Default for ChatClient {
    fn default() -> Self {
        Self::new(FocusMode::WebSearch)
    }
}

impl ChatClient {
    /// Creates an empty conversation using the given focus mode.
    pub fn new(focus_mode: FocusMode) -> Self {
        Self {
            focus_mode,
            domain: None,
            transcript: Vec::new(),
            history: Vec::new(),
            pending: None,
            response_appeared: false,
        }
    }

    pub fn focus_mode(&self) -> FocusMode {
        self.focus_mode
    }

    /// Switches the focus mode used by later submissions.
    pub fn set_focus_mode(&mut self, focus_mode: FocusMode) {
        self.focus_mode = focus_mode;
    }

    pub fn domain(&self) -> Option<&str> {
        self.domain.as_deref()
    }

    /// Sets or clears the site restriction sent with later submissions.
    pub fn set_domain(&mut self, domain: Option<String>) {
        self.domain = domain.filter(|d| !d.trim().is_empty());
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn history(&self) -> &[ChatTurn] {
        &self.history
    }

    /// True while a submission awaits its terminal frame.
    pub fn is_loading(&self) -> bool {
        self.pending.is_some()
    }

    /// True once the in-flight answer produced its first sources or text.
    pub fn response_appeared(&self) -> bool {
        self.response_appeared
    }

    /// Request id the in-flight submission is bound to, if any.
    pub fn pending_request_id(&self) -> Option<&RequestId> {
        self.pending.as_ref().and_then(|p| p.request_id.as_ref())
    }

    /// Starts a new exchange.
    ///
    /// Returns the request to send, or `None` if a submission is already in
    /// flight or the text is empty. The user entry is appended immediately.
    pub fn submit(&mut self, text: impl Into<String>) -> Option<InboundRequest> {
        let text = text.into();
        if self.pending.is_some() || text.is_empty() {
            return None;
        }

        self.response_appeared = false;
        self.transcript.push(TranscriptEntry::user(text.clone()));

        let mut history = self.history.clone();
        history.push(ChatTurn::human(text.clone()));

        let mut request = InboundRequest::new(text.clone(), self.focus_mode.as_str(), history);
        if let Some(domain) = &self.domain {
            request = request.with_domain(domain.clone());
        }

        self.pending = Some(PendingSubmission {
            text,
            request_id: None,
            entry_id: None,
            answer: String::new(),
        });
        Some(request)
    }

    /// Applies one frame from the server.
    pub fn handle_frame(&mut self, frame: OutboundFrame) -> ClientUpdate {
        match frame {
            OutboundFrame::Sources {
                request_id,
                sources,
            } => self.on_sources(request_id, sources),
            OutboundFrame::MessageDelta { request_id, text } => self.on_delta(request_id, text),
            OutboundFrame::StreamEnd { request_id } => self.on_stream_end(request_id),
            OutboundFrame::Error {
                request_id: Some(request_id),
                message,
            } => self.on_request_error(request_id, message),
            OutboundFrame::Error {
                request_id: None,
                message,
            } => self.on_connection_error(message),
        }
    }

    /// Gives up on the in-flight submission after a transport failure.
    ///
    /// Partial output stays in the transcript; history is untouched. Returns
    /// false if nothing was in flight.
    pub fn abandon(&mut self) -> bool {
        self.response_appeared = false;
        self.pending.take().is_some()
    }

    /// Regenerates the answer of the given assistant entry.
    ///
    /// Drops the entry and the user turn before it (plus everything after),
    /// then resubmits that user turn. When the transcript holds two entries
    /// or fewer it is cleared entirely. Returns `None` without touching any
    /// state if the entry is unknown, is not an assistant entry, has no
    /// predecessor, or a submission is in flight.
    pub fn rewrite(&mut self, entry_id: &EntryId) -> Option<InboundRequest> {
        if self.pending.is_some() {
            return None;
        }

        let index = self
            .transcript
            .iter()
            .position(|entry| entry.id() == entry_id)?;
        if index == 0 || self.transcript[index].role() != EntryRole::Assistant {
            return None;
        }

        let prompt = self.transcript[index - 1].text().to_string();
        // Mirrors the reference client: short transcripts are cleared, longer
        // ones are cut at the preceding user turn.
        let keep = if self.transcript.len() > 2 { index - 1 } else { 0 };
        self.transcript.truncate(keep);
        self.history.truncate(keep);

        self.submit(prompt)
    }

    fn on_sources(&mut self, request_id: RequestId, sources: Vec<SourceRef>) -> ClientUpdate {
        if !self.claim(&request_id) {
            return ClientUpdate::Ignored;
        }
        self.assistant_entry().attach_sources(sources);
        self.response_appeared = true;
        ClientUpdate::SourcesAttached { request_id }
    }

    fn on_delta(&mut self, request_id: RequestId, text: String) -> ClientUpdate {
        if !self.claim(&request_id) {
            return ClientUpdate::Ignored;
        }
        self.assistant_entry().append(&text);
        if let Some(pending) = self.pending.as_mut() {
            pending.answer.push_str(&text);
        }
        self.response_appeared = true;
        ClientUpdate::TextAppended { request_id, text }
    }

    fn on_stream_end(&mut self, request_id: RequestId) -> ClientUpdate {
        if !self.claim(&request_id) {
            return ClientUpdate::Ignored;
        }
        let Some(pending) = self.pending.take() else {
            return ClientUpdate::Ignored;
        };
        self.history.push(ChatTurn::human(pending.text));
        self.history.push(ChatTurn::assistant(pending.answer.clone()));
        ClientUpdate::Completed {
            request_id,
            entry_id: pending.entry_id,
            answer: pending.answer,
        }
    }

    fn on_request_error(&mut self, request_id: RequestId, message: String) -> ClientUpdate {
        if !self.claim(&request_id) {
            return ClientUpdate::Ignored;
        }
        self.pending = None;
        ClientUpdate::Failed {
            request_id: Some(request_id),
            message,
        }
    }

    fn on_connection_error(&mut self, message: String) -> ClientUpdate {
        // The server rejects a request before allocating an id, so an unbound
        // submission is the one this error answers.
        let unbound = self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.request_id.is_none());
        if unbound {
            self.pending = None;
            return ClientUpdate::Failed {
                request_id: None,
                message,
            };
        }
        ClientUpdate::ConnectionError { message }
    }

    /// Binds the pending submission to `request_id` on first sight.
    ///
    /// Returns false if there is no pending submission or it is bound to a
    /// different id.
    fn claim(&mut self, request_id: &RequestId) -> bool {
        let Some(pending) = self.pending.as_mut() else {
            return false;
        };
        match &pending.request_id {
            Some(bound) => bound == request_id,
            None => {
                pending.request_id = Some(request_id.clone());
                true
            }
        }
    }

    /// Entry of the in-flight answer, created on first use.
    ///
    /// Only called after `claim` succeeded, so a submission is pending.
    fn assistant_entry(&mut self) -> &mut TranscriptEntry {
        let existing = self
            .pending
            .as_ref()
            .and_then(|pending| pending.entry_id.as_ref())
            .and_then(|id| self.transcript.iter().rposition(|entry| entry.id() == id));
        let index = match existing {
            Some(index) => index,
            None => {
                let entry = TranscriptEntry::assistant();
                if let Some(pending) = self.pending.as_mut() {
                    pending.entry_id = Some(entry.id().clone());
                }
                self.transcript.push(entry);
                self.transcript.len() - 1
            }
        };
        &mut self.transcript[index]
    }
}
