//! A deterministic transport that replays scripted outcomes.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::Transport;
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{PreparedRequest, RawResponse};

type Outcome = Result<RawResponse, TransportError>;

/// Replays a queue of outcomes, one per `send`, and records every request it
/// receives. Once the queue is empty it keeps returning the fallback outcome,
/// or an `Other` transport error if none was set.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Outcome>>,
    fallback: Option<Outcome>,
    seen: Mutex<Vec<PreparedRequest>>,
}

impl ScriptedTransport {
    pub fn new(outcomes: impl IntoIterator<Item = Outcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().collect()),
            fallback: None,
            seen: Mutex::new(Vec::new()),
        }
    }

    /// A transport that answers every request with `response`.
    pub fn always(response: RawResponse) -> Self {
        Self::default().with_fallback(Ok(response))
    }

    /// A transport on which every exchange fails with `error`.
    pub fn always_failing(error: TransportError) -> Self {
        Self::default().with_fallback(Err(error))
    }

    /// Fail `failures` times with `error`, then answer with `response`.
    pub fn failing_then(failures: u32, error: TransportError, response: RawResponse) -> Self {
        let mut outcomes: Vec<Outcome> = (0..failures).map(|_| Err(error.clone())).collect();
        outcomes.push(Ok(response));
        Self::new(outcomes)
    }

    pub fn with_fallback(mut self, outcome: Outcome) -> Self {
        self.fallback = Some(outcome);
        self
    }

    /// Number of `send` calls so far.
    pub fn calls(&self) -> usize {
        self.seen.lock().map(|seen| seen.len()).unwrap_or_default()
    }

    /// Every request received, in order.
    pub fn requests(&self) -> Vec<PreparedRequest> {
        self.seen.lock().map(|seen| seen.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl Transport for ScriptedTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        if let Ok(mut seen) = self.seen.lock() {
            seen.push(request.clone());
        }
        let next = self.script.lock().ok().and_then(|mut script| script.pop_front());
        match (next, &self.fallback) {
            (Some(outcome), _) => outcome,
            (None, Some(fallback)) => fallback.clone(),
            (None, None) => Err(TransportError::new(
                TransportErrorKind::Other,
                "scripted transport has no outcome left",
            )),
        }
    }
}
