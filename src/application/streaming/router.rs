//! Request router: inbound frame → handler invocation → bridge task.

use std::sync::Arc;

use tracing::Instrument;

use crate::domain::conversation::FocusMode;
use crate::domain::foundation::RequestId;
use crate::domain::protocol::{InboundRequest, OutboundFrame, ProtocolError};
use crate::ports::{ChatModelRef, EmbeddingsRef, FocusHandler, HandlerInvocation};

use super::bridge::{bridge, BridgeOutcome, StreamLimits};
use super::registry::HandlerRegistry;
use super::session::ConnectionSession;

/// Validates inbound frames and starts a bridged handler for each accepted one.
///
/// Shared across connections; all per-connection state lives in the
/// [`ConnectionSession`] passed to [`RequestRouter::route`].
#[derive(Clone)]
pub struct RequestRouter {
    registry: Arc<HandlerRegistry>,
    chat_model: ChatModelRef,
    embeddings: EmbeddingsRef,
    limits: StreamLimits,
}

struct Dispatch {
    mode: FocusMode,
    handler: Arc<dyn FocusHandler>,
    request: InboundRequest,
    domain: Option<String>,
}

impl RequestRouter {
    pub fn new(
        registry: Arc<HandlerRegistry>,
        chat_model: ChatModelRef,
        embeddings: EmbeddingsRef,
    ) -> Self {
        Self {
            registry,
            chat_model,
            embeddings,
            limits: StreamLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: StreamLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    pub fn limits(&self) -> StreamLimits {
        self.limits
    }

    /// Handles one inbound text frame.
    ///
    /// On success the handler has been invoked and its stream handed to a
    /// bridge task tracked by `session`; the call returns without waiting for
    /// the answer. On failure a connection-level error frame has been queued
    /// and no request id was consumed.
    pub async fn route(
        &self,
        raw: &str,
        session: &Arc<ConnectionSession>,
    ) -> Result<RequestId, ProtocolError> {
        match self.prepare(raw) {
            Ok(dispatch) => Ok(self.dispatch(dispatch, session)),
            Err(err) => {
                tracing::warn!(
                    connection_id = %session.connection_id(),
                    error = %err,
                    "rejected inbound frame"
                );
                if session
                    .send(OutboundFrame::connection_error(err.client_message()))
                    .await
                    .is_err()
                {
                    tracing::debug!(
                        connection_id = %session.connection_id(),
                        "connection closed before error frame could be sent"
                    );
                }
                Err(err)
            }
        }
    }

    /// Handles one inbound binary frame; accepted only if it is UTF-8 text.
    pub async fn route_binary(
        &self,
        raw: &[u8],
        session: &Arc<ConnectionSession>,
    ) -> Result<RequestId, ProtocolError> {
        match std::str::from_utf8(raw) {
            Ok(text) => self.route(text, session).await,
            Err(_) => {
                let err = ProtocolError::malformed("binary frame is not valid UTF-8");
                tracing::warn!(
                    connection_id = %session.connection_id(),
                    error = %err,
                    "rejected inbound frame"
                );
                let _ = session
                    .send(OutboundFrame::connection_error(err.client_message()))
                    .await;
                Err(err)
            }
        }
    }

    /// Parsing, validation and handler lookup. Synchronous and side-effect free.
    fn prepare(&self, raw: &str) -> Result<Dispatch, ProtocolError> {
        let request = InboundRequest::parse(raw)?;
        let (mode, handler) = self.registry.resolve(&request.focus_mode)?;

        let domain = if mode.is_domain_scoped() {
            let domain = request.domain().ok_or_else(|| {
                ProtocolError::malformed(format!("focus mode '{mode}' requires a domain"))
            })?;
            Some(domain.to_string())
        } else {
            None
        };

        Ok(Dispatch {
            mode,
            handler,
            request,
            domain,
        })
    }

    fn dispatch(&self, dispatch: Dispatch, session: &Arc<ConnectionSession>) -> RequestId {
        let Dispatch {
            mode,
            handler,
            request,
            domain,
        } = dispatch;

        let request_id = session.next_request_id();
        let cancellation = session.request_token();

        let span = tracing::info_span!(
            "request",
            connection_id = %session.connection_id(),
            request_id = %request_id,
            focus_mode = %mode,
        );

        let events = span.in_scope(|| {
            tracing::info!(handler = handler.name(), history = request.history.len(), "dispatching request");
            handler.invoke(HandlerInvocation {
                query: request.content,
                history: request.history,
                chat_model: Arc::clone(&self.chat_model),
                embeddings: Arc::clone(&self.embeddings),
                domain,
                cancellation: cancellation.clone(),
            })
        });

        let task_session = Arc::clone(session);
        let task_request_id = request_id.clone();
        let limits = self.limits;
        session.spawn(
            async move {
                let report = bridge(events, task_request_id, &task_session, cancellation, limits).await;
                match report.outcome {
                    BridgeOutcome::Completed => tracing::info!(
                        outcome = report.outcome.as_str(),
                        deltas = report.deltas,
                        sources = report.sources_sent,
                        "request finished"
                    ),
                    _ => tracing::warn!(
                        outcome = report.outcome.as_str(),
                        deltas = report.deltas,
                        sources = report.sources_sent,
                        "request ended early"
                    ),
                }
            }
            .instrument(span),
        );

        request_id
    }
}
