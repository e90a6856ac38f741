//! The request pipeline and its caller-facing client.
//!
//! # Design
//! A request moves through `Building → Sending → Classifying → Decoding →
//! Done`, and any stage can end in `Failed`. Only `Sending` repeats, inside
//! the retry loop. `NetworkClient` holds only the transport and its
//! configuration, so one client serves any number of concurrent requests.

use serde::de::DeserializeOwned;
use tokio_util::sync::CancellationToken;
use tracing::Instrument;

use crate::config::ClientConfig;
use crate::decode::decode;
use crate::endpoint::EndpointDescriptor;
use crate::error::{ErrorKind, OutcomeError};
use crate::request::build;
use crate::response::classify;
use crate::retry::execute;
use crate::transport::Transport;

/// Where a single request currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Building,
    Sending,
    Classifying,
    Decoding,
    Done,
    Failed(ErrorKind),
}

impl Stage {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Stage::Done | Stage::Failed(_))
    }

    fn next(&self) -> Option<Stage> {
        match self {
            Stage::Building => Some(Stage::Sending),
            Stage::Sending => Some(Stage::Classifying),
            Stage::Classifying => Some(Stage::Decoding),
            Stage::Decoding => Some(Stage::Done),
            Stage::Done | Stage::Failed(_) => None,
        }
    }
}

/// Tracks the stage of one request. Never reused once terminal.
#[derive(Debug)]
pub struct Pipeline {
    stage: Stage,
}

impl Default for Pipeline {
    fn default() -> Self {
        Self::new()
    }
}

impl Pipeline {
    pub fn new() -> Self {
        Self {
            stage: Stage::Building,
        }
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    /// Move to the next stage. A terminal pipeline stays where it is.
    pub fn advance(&mut self) -> Stage {
        if let Some(next) = self.stage.next() {
            tracing::trace!(from = ?self.stage, to = ?next, "pipeline advance");
            self.stage = next;
        }
        self.stage
    }

    /// Record `err` as the terminal outcome and hand it back.
    pub fn fail(&mut self, err: OutcomeError) -> OutcomeError {
        if !self.stage.is_terminal() {
            tracing::debug!(stage = ?self.stage, kind = ?err.kind(), "pipeline failed");
            self.stage = Stage::Failed(err.kind());
        }
        err
    }

    /// Run `result` through the pipeline: failures become terminal.
    pub fn check<T>(&mut self, result: Result<T, OutcomeError>) -> Result<T, OutcomeError> {
        result.map_err(|e| self.fail(e))
    }
}

/// Turns endpoint descriptors into decoded values over a transport.
#[derive(Debug, Clone)]
pub struct NetworkClient<T> {
    transport: T,
    config: ClientConfig,
}

impl<T: Transport> NetworkClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            config: ClientConfig::default(),
        }
    }

    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Build, send, classify and decode one request.
    pub async fn request<R: DeserializeOwned>(&self, endpoint: &EndpointDescriptor) -> Result<R, OutcomeError> {
        self.request_with_cancel(endpoint, &CancellationToken::new()).await
    }

    /// Like [`request`](Self::request), failing with a `Cancelled` transport
    /// cause as soon as `cancel` fires while sending or waiting to retry.
    pub async fn request_with_cancel<R: DeserializeOwned>(
        &self,
        endpoint: &EndpointDescriptor,
        cancel: &CancellationToken,
    ) -> Result<R, OutcomeError> {
        let span = tracing::debug_span!("request", method = %endpoint.method, host = %endpoint.host, path = %endpoint.path);
        self.run(endpoint, cancel).instrument(span).await
    }

    async fn run<R: DeserializeOwned>(
        &self,
        endpoint: &EndpointDescriptor,
        cancel: &CancellationToken,
    ) -> Result<R, OutcomeError> {
        let mut pipeline = Pipeline::new();

        let request = pipeline.check(build(endpoint))?;
        pipeline.advance();

        let policy = self.config.retry_policy(endpoint.max_attempts);
        let response = pipeline.check(execute(&request, &policy, &self.transport, cancel).await)?;
        pipeline.advance();

        let verdict = classify(&response);
        tracing::debug!(status = ?response.status, ?verdict, "classified response");
        pipeline.check(verdict.into_result())?;
        pipeline.advance();

        let value = pipeline.check(decode(&response.body, response.content_type.as_deref()))?;
        pipeline.advance();
        Ok(value)
    }
}

impl<T: Transport + Default> Default for NetworkClient<T> {
    fn default() -> Self {
        Self::new(T::default())
    }
}
