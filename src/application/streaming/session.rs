//! Per-connection state shared by the router and every bridge task.
//!
//! A session owns the outbound frame queue of one transport connection, the
//! request id counter, and the tasks bridging in-flight requests. Closing the
//! session cancels every request token and waits for the bridges to finish.

use std::future::Future;

use thiserror::Error;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::domain::foundation::{ConnectionId, RequestId, RequestIdSequence};
use crate::domain::protocol::OutboundFrame;

/// The transport side of the session is gone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("connection closed")]
pub struct SessionClosed;

/// One persistent connection.
#[derive(Debug)]
pub struct ConnectionSession {
    connection_id: ConnectionId,
    outbound: mpsc::Sender<OutboundFrame>,
    request_ids: RequestIdSequence,
    shutdown: CancellationToken,
    tasks: TaskTracker,
}

impl ConnectionSession {
    /// Creates a session writing frames into `outbound`.
    ///
    /// The receiving end is drained by the transport's writer task.
    pub fn new(outbound: mpsc::Sender<OutboundFrame>) -> Self {
        Self {
            connection_id: ConnectionId::new(),
            outbound,
            request_ids: RequestIdSequence::new(),
            shutdown: CancellationToken::new(),
            tasks: TaskTracker::new(),
        }
    }

    /// Creates a session and the receiver its frames arrive on.
    pub fn channel(buffer: usize) -> (Self, mpsc::Receiver<OutboundFrame>) {
        let (tx, rx) = mpsc::channel(buffer.max(1));
        (Self::new(tx), rx)
    }

    pub fn connection_id(&self) -> ConnectionId {
        self.connection_id
    }

    /// Allocates the next request id.
    pub fn next_request_id(&self) -> RequestId {
        self.request_ids.next_id()
    }

    /// Number of request ids handed out so far.
    pub fn requests_started(&self) -> u64 {
        self.request_ids.allocated()
    }

    /// Queues a frame for the transport.
    ///
    /// Waits while the queue is full, which applies backpressure to the
    /// producing handler.
    pub async fn send(&self, frame: OutboundFrame) -> Result<(), SessionClosed> {
        if self.shutdown.is_cancelled() {
            return Err(SessionClosed);
        }
        self.outbound.send(frame).await.map_err(|_| SessionClosed)
    }

    /// Token for one request; cancelled when the session closes.
    pub fn request_token(&self) -> CancellationToken {
        self.shutdown.child_token()
    }

    /// Runs a request task tracked by this session.
    pub fn spawn<F>(&self, task: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.tasks.spawn(task);
    }

    /// Number of request tasks still running.
    pub fn active_requests(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_closed(&self) -> bool {
        self.shutdown.is_cancelled() || self.outbound.is_closed()
    }

    /// Resolves once the session starts closing.
    pub async fn closed(&self) {
        self.shutdown.cancelled().await;
    }

    /// Cancels every in-flight request and waits for their tasks to end.
    pub async fn close(&self) {
        self.shutdown.cancel();
        self.tasks.close();
        self.tasks.wait().await;
    }
}
