//! Event bridge: handler event stream → framed messages for one request.
//!
//! # Frame mapping
//!
//! | Handler event     | Frame                          |
//! |-------------------|--------------------------------|
//! | `AnswerToken(t)`  | `message { data: t }`          |
//! | `Sources(list)`   | `sources` (first one only)     |
//! | `Error(msg)`      | `error { messageId }`, stop    |
//! | stream completes  | `messageEnd`, stop             |
//!
//! Exactly one terminal frame is sent per request unless the transport goes
//! away first. Whenever the bridge returns, the handler's cancellation token
//! is cancelled and its stream dropped.

use std::time::Duration;

use futures::StreamExt;
use tokio_util::sync::CancellationToken;

use crate::domain::conversation::HandlerEvent;
use crate::domain::foundation::RequestId;
use crate::domain::protocol::OutboundFrame;
use crate::ports::HandlerEventStream;

use super::session::{ConnectionSession, SessionClosed};

/// Text of the error frame sent when a request runs out of time.
pub const TIMEOUT_MESSAGE: &str = "Request timed out";

/// Per-request time limits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamLimits {
    /// Upper bound on the whole request.
    pub request_timeout: Duration,
    /// Upper bound on the gap between two handler events.
    pub idle_timeout: Duration,
}

impl Default for StreamLimits {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(300),
            idle_timeout: Duration::from_secs(60),
        }
    }
}

/// How a bridged request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BridgeOutcome {
    /// The handler completed and `messageEnd` was sent.
    Completed,
    /// The handler emitted an error; a request-scoped error frame was sent.
    HandlerFailed,
    /// A time limit expired; a request-scoped error frame was sent.
    TimedOut,
    /// The transport closed or the request was cancelled.
    Detached,
}

impl BridgeOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            BridgeOutcome::Completed => "completed",
            BridgeOutcome::HandlerFailed => "handler_failed",
            BridgeOutcome::TimedOut => "timed_out",
            BridgeOutcome::Detached => "detached",
        }
    }
}

/// Summary of one bridged request, used for logging and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BridgeReport {
    pub outcome: BridgeOutcome,
    /// `message` frames sent.
    pub deltas: usize,
    /// Whether a `sources` frame was sent.
    pub sources_sent: bool,
    /// Extra `sources` events that were dropped.
    pub sources_rejected: usize,
}

impl BridgeReport {
    fn new() -> Self {
        Self {
            outcome: BridgeOutcome::Detached,
            deltas: 0,
            sources_sent: false,
            sources_rejected: 0,
        }
    }

    fn finish(mut self, outcome: BridgeOutcome) -> Self {
        self.outcome = outcome;
        self
    }
}

enum Step {
    Event(HandlerEvent),
    Exhausted,
    Expired,
    Cancelled,
}

/// Forwards `events` to `session` as frames tagged with `request_id`.
///
/// Returns when a terminal frame has been sent, the token is cancelled, or
/// the session can no longer accept frames.
pub async fn bridge(
    mut events: HandlerEventStream,
    request_id: RequestId,
    session: &ConnectionSession,
    cancellation: CancellationToken,
    limits: StreamLimits,
) -> BridgeReport {
    let _cancel_on_exit = cancellation.clone().drop_guard();
    let mut report = BridgeReport::new();

    let deadline = tokio::time::sleep(limits.request_timeout);
    tokio::pin!(deadline);

    loop {
        let step = tokio::select! {
            biased;
            _ = cancellation.cancelled() => Step::Cancelled,
            _ = &mut deadline => Step::Expired,
            next = tokio::time::timeout(limits.idle_timeout, events.next()) => match next {
                Ok(Some(event)) => Step::Event(event),
                Ok(None) => Step::Exhausted,
                Err(_) => Step::Expired,
            },
        };

        let sent = match step {
            Step::Cancelled => return report.finish(BridgeOutcome::Detached),
            Step::Exhausted => {
                return match session.send(OutboundFrame::stream_end(request_id)).await {
                    Ok(()) => report.finish(BridgeOutcome::Completed),
                    Err(SessionClosed) => report.finish(BridgeOutcome::Detached),
                };
            }
            Step::Expired => {
                tracing::warn!(request_id = %request_id, "request exceeded its time limit");
                return match session
                    .send(OutboundFrame::request_error(request_id, TIMEOUT_MESSAGE))
                    .await
                {
                    Ok(()) => report.finish(BridgeOutcome::TimedOut),
                    Err(SessionClosed) => report.finish(BridgeOutcome::Detached),
                };
            }
            Step::Event(HandlerEvent::Error(message)) => {
                tracing::debug!(request_id = %request_id, error = %message, "handler failed");
                return match session
                    .send(OutboundFrame::request_error(request_id, message))
                    .await
                {
                    Ok(()) => report.finish(BridgeOutcome::HandlerFailed),
                    Err(SessionClosed) => report.finish(BridgeOutcome::Detached),
                };
            }
            Step::Event(HandlerEvent::AnswerToken(text)) => {
                let sent = session
                    .send(OutboundFrame::delta(request_id.clone(), text))
                    .await;
                if sent.is_ok() {
                    report.deltas += 1;
                }
                sent
            }
            Step::Event(HandlerEvent::Sources(sources)) => {
                if report.sources_sent {
                    report.sources_rejected += 1;
                    tracing::warn!(
                        request_id = %request_id,
                        count = sources.len(),
                        "handler emitted sources more than once; dropping"
                    );
                    continue;
                }
                let sent = session
                    .send(OutboundFrame::sources(request_id.clone(), sources))
                    .await;
                report.sources_sent = sent.is_ok();
                sent
            }
        };

        if sent.is_err() {
            return report.finish(BridgeOutcome::Detached);
        }
    }
}
