//! Plumbing shared by the default handlers: a spawned producer task feeding
//! a bounded channel that the bridge consumes as a stream.

use std::future::Future;

use futures::channel::mpsc;
use futures::{SinkExt, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::domain::conversation::{HandlerEvent, SourceRef};
use crate::ports::{ChatModelRef, CompletionRequest, HandlerEventStream};

/// Text sent to clients when a handler fails; details go to the log.
pub const GENERIC_FAILURE: &str = "An error has occurred please try again later";

const EVENT_BUFFER: usize = 32;

/// Receiver went away; the producer should stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detached;

/// Producer side of a handler's event stream.
pub struct EventSink {
    tx: mpsc::Sender<HandlerEvent>,
}

impl EventSink {
    pub async fn emit(&mut self, event: HandlerEvent) -> Result<(), Detached> {
        self.tx.send(event).await.map_err(|_| Detached)
    }

    pub async fn token(&mut self, text: impl Into<String>) -> Result<(), Detached> {
        self.emit(HandlerEvent::token(text)).await
    }

    pub async fn sources(&mut self, sources: Vec<SourceRef>) -> Result<(), Detached> {
        self.emit(HandlerEvent::Sources(sources)).await
    }

    /// Emits the terminal error event.
    pub async fn fail(&mut self, message: impl Into<String>) -> Result<(), Detached> {
        self.emit(HandlerEvent::error(message)).await
    }
}

/// Runs `produce` on its own task and returns the stream it feeds.
///
/// The task stops when `cancellation` fires. The stream ends when `produce`
/// returns.
pub fn spawn_producer<F, Fut>(cancellation: CancellationToken, produce: F) -> HandlerEventStream
where
    F: FnOnce(EventSink) -> Fut,
    Fut: Future<Output = ()> + Send + 'static,
{
    let (tx, rx) = mpsc::channel(EVENT_BUFFER);
    let work = produce(EventSink { tx });
    tokio::spawn(async move {
        tokio::select! {
            _ = cancellation.cancelled() => {
                tracing::debug!("handler cancelled");
            }
            _ = work => {}
        }
    });
    Box::pin(rx)
}

/// Streams a completion into `sink` as answer tokens.
///
/// Model errors become a terminal error event.
pub async fn stream_answer(
    model: &ChatModelRef,
    request: CompletionRequest,
    sink: &mut EventSink,
) -> Result<(), Detached> {
    let mut chunks = match model.stream_complete(request).await {
        Ok(chunks) => chunks,
        Err(err) => {
            tracing::error!(error = %err, provider = %model.provider_info().name, "completion failed to start");
            return sink.fail(GENERIC_FAILURE).await;
        }
    };

    while let Some(chunk) = chunks.next().await {
        match chunk {
            Ok(chunk) if chunk.delta.is_empty() => {}
            Ok(chunk) => sink.token(chunk.delta).await?,
            Err(err) => {
                tracing::error!(error = %err, "completion stream failed");
                return sink.fail(GENERIC_FAILURE).await;
            }
        }
    }
    Ok(())
}
