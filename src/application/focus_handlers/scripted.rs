//! Deterministic handler that replays a fixed event script.
//!
//! Used by tests and local demos to exercise the streaming path without a
//! model or search backend. Every invocation is recorded for inspection.

use std::sync::{Mutex, MutexGuard};
use std::time::Duration;

use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;

use crate::domain::conversation::HandlerEvent;
use crate::ports::{FocusHandler, HandlerEventStream, HandlerInvocation};

#[derive(Debug, Clone)]
enum Script {
    Events(Vec<HandlerEvent>),
    /// Never emits; ends only when cancelled.
    Stalled,
}

#[derive(Debug, Clone)]
struct Recorded {
    query: String,
    domain: Option<String>,
    history_len: usize,
    cancellation: CancellationToken,
}

/// Replays a fixed sequence of events for every invocation.
#[derive(Debug)]
pub struct ScriptedHandler {
    script: Script,
    delay: Duration,
    recorded: Mutex<Vec<Recorded>>,
}

impl ScriptedHandler {
    /// Replays `events` in order, then completes.
    pub fn new(events: Vec<HandlerEvent>) -> Self {
        Self::from_script(Script::Events(events))
    }

    /// Streams `text` word by word.
    pub fn answer(text: &str) -> Self {
        Self::new(text.split_inclusive(' ').map(HandlerEvent::token).collect())
    }

    /// Emits a single error event.
    pub fn failing(message: &str) -> Self {
        Self::new(vec![HandlerEvent::error(message)])
    }

    /// Never emits anything until cancelled.
    pub fn stalled() -> Self {
        Self::from_script(Script::Stalled)
    }

    /// Waits `delay` before each event.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn from_script(script: Script) -> Self {
        Self {
            script,
            delay: Duration::ZERO,
            recorded: Mutex::new(Vec::new()),
        }
    }

    fn recorded(&self) -> MutexGuard<'_, Vec<Recorded>> {
        self.recorded.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Number of times the handler was invoked.
    pub fn invocations(&self) -> usize {
        self.recorded().len()
    }

    /// Queries received, in invocation order.
    pub fn queries(&self) -> Vec<String> {
        self.recorded().iter().map(|r| r.query.clone()).collect()
    }

    /// Domains received, in invocation order.
    pub fn domains(&self) -> Vec<Option<String>> {
        self.recorded().iter().map(|r| r.domain.clone()).collect()
    }

    /// History lengths received, in invocation order.
    pub fn history_lengths(&self) -> Vec<usize> {
        self.recorded().iter().map(|r| r.history_len).collect()
    }

    /// Cancellation token of the latest invocation.
    pub fn last_token(&self) -> Option<CancellationToken> {
        self.recorded().last().map(|r| r.cancellation.clone())
    }
}

impl FocusHandler for ScriptedHandler {
    fn invoke(&self, invocation: HandlerInvocation) -> HandlerEventStream {
        let cancellation = invocation.cancellation.clone();
        self.recorded().push(Recorded {
            query: invocation.query,
            domain: invocation.domain,
            history_len: invocation.history.len(),
            cancellation: cancellation.clone(),
        });

        let stop = cancellation.cancelled_owned();
        match &self.script {
            Script::Stalled => stream::pending::<HandlerEvent>().take_until(stop).boxed(),
            Script::Events(events) => {
                let delay = self.delay;
                stream::iter(events.clone())
                    .then(move |event| async move {
                        if !delay.is_zero() {
                            tokio::time::sleep(delay).await;
                        }
                        event
                    })
                    .take_until(stop)
                    .boxed()
            }
        }
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}
