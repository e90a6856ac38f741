//! Blocking `ureq` agent driven from the async executor.
//!
//! Each exchange runs on tokio's blocking pool. The agent is configured with
//! `http_status_as_error(false)` so 4xx/5xx replies come back as responses
//! for the classifier instead of being reported as transport failures, and
//! with `max_redirects(0)` so 3xx replies reach the classifier as well.

use std::io;

use async_trait::async_trait;
use ureq::http::header::CONTENT_TYPE;
use ureq::http::Response;
use ureq::{Agent, Body, RequestBuilder};

use super::Transport;
use crate::error::{TransportError, TransportErrorKind};
use crate::http::{HttpMethod, PreparedRequest, RawResponse};

#[derive(Clone)]
pub struct UreqTransport {
    agent: Agent,
}

impl UreqTransport {
    pub fn new() -> Self {
        let agent = Agent::config_builder()
            .http_status_as_error(false)
            .max_redirects(0)
            .build()
            .new_agent();
        Self { agent }
    }

    /// Use a caller-configured agent. It must set `http_status_as_error(false)`
    /// and `max_redirects(0)`, or error and redirect statuses would surface as
    /// transport failures and be retried.
    pub fn with_agent(agent: Agent) -> Self {
        Self { agent }
    }
}

impl Default for UreqTransport {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Transport for UreqTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let agent = self.agent.clone();
        let request = request.clone();
        tokio::task::spawn_blocking(move || send_blocking(&agent, &request))
            .await
            .map_err(|e| TransportError::new(TransportErrorKind::Other, e.to_string()))?
    }
}

fn send_blocking(agent: &Agent, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
    let url = request.url.as_str();
    let result = match request.method {
        HttpMethod::Get => configure(agent.get(url), request).call(),
        HttpMethod::Delete => configure(agent.delete(url), request).call(),
        HttpMethod::Post => configure(agent.post(url), request).send_empty(),
        HttpMethod::Put => configure(agent.put(url), request).send_empty(),
        HttpMethod::Patch => configure(agent.patch(url), request).send_empty(),
    };
    let response = result.map_err(map_error)?;
    into_raw(response)
}

fn configure<B>(builder: RequestBuilder<B>, request: &PreparedRequest) -> RequestBuilder<B> {
    let mut builder = builder
        .config()
        .timeout_global(Some(request.timeout))
        .build();
    for (name, value) in &request.headers {
        builder = builder.header(name.as_str(), value.as_str());
    }
    if let Some(directive) = request.cache_policy.cache_control() {
        builder = builder.header("Cache-Control", directive);
    }
    builder
}

fn into_raw(mut response: Response<Body>) -> Result<RawResponse, TransportError> {
    let status = response.status().as_u16();
    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let body = response.body_mut().read_to_vec().map_err(map_error)?;
    Ok(RawResponse {
        status: Some(status),
        content_type,
        body,
    })
}

fn map_error(err: ureq::Error) -> TransportError {
    let kind = match &err {
        ureq::Error::Timeout(_) => TransportErrorKind::Timeout,
        ureq::Error::HostNotFound | ureq::Error::ConnectionFailed => TransportErrorKind::Connect,
        ureq::Error::Http(_) | ureq::Error::BadUri(_) => TransportErrorKind::InvalidRequest,
        ureq::Error::Io(e) => match e.kind() {
            io::ErrorKind::TimedOut => TransportErrorKind::Timeout,
            io::ErrorKind::ConnectionRefused => TransportErrorKind::Connect,
            _ => TransportErrorKind::Io,
        },
        _ => TransportErrorKind::Other,
    };
    TransportError::new(kind, err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_request_maps_to_invalid_request() {
        let bad_name = ureq::http::HeaderName::from_bytes(b"bad header").unwrap_err();
        let err = map_error(ureq::Error::Http(bad_name.into()));
        assert_eq!(err.kind, TransportErrorKind::InvalidRequest);

        let err = map_error(ureq::Error::BadUri("no host".to_string()));
        assert_eq!(err.kind, TransportErrorKind::InvalidRequest);
    }

    #[test]
    fn network_failures_map_to_retryable_kinds() {
        assert_eq!(map_error(ureq::Error::HostNotFound).kind, TransportErrorKind::Connect);
        assert_eq!(map_error(ureq::Error::ConnectionFailed).kind, TransportErrorKind::Connect);
        let refused = io::Error::from(io::ErrorKind::ConnectionRefused);
        assert_eq!(map_error(ureq::Error::Io(refused)).kind, TransportErrorKind::Connect);
        let reset = io::Error::from(io::ErrorKind::ConnectionReset);
        assert_eq!(map_error(ureq::Error::Io(reset)).kind, TransportErrorKind::Io);
    }
}
