//! Bounded retry of transport failures.
//!
//! Only exchanges the transport could not complete are retried. A response
//! with any status, including 4xx and 5xx, ends the loop and goes to the
//! classifier.

use std::time::Duration;

use tokio_util::sync::CancellationToken;

use crate::endpoint::DEFAULT_MAX_ATTEMPTS;
use crate::error::{OutcomeError, TransportError, TransportErrorKind};
use crate::http::{PreparedRequest, RawResponse};
use crate::transport::Transport;

pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(2);

/// How many attempts to make and how long to wait between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts including the first. Zero makes no attempt at all.
    pub max_attempts: u32,
    /// Fixed pause between a failed attempt and the next one.
    pub delay: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, delay: Duration) -> Self {
        Self { max_attempts, delay }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_RETRY_DELAY)
    }
}

/// Send `request` until the transport completes an exchange or the policy's
/// attempts are used up.
///
/// With `N` attempts the loop sleeps after each of the first `N - 1`
/// failures and returns `RequestFailed` with the last cause after the `N`th,
/// without sleeping again. Causes that cannot clear on their own
/// ([`TransportErrorKind::is_retryable`]) end the loop at once. Cancelling
/// `cancel` aborts an in-flight send or a pending delay with a `Cancelled`
/// cause.
pub async fn execute<T>(
    request: &PreparedRequest,
    policy: &RetryPolicy,
    transport: &T,
    cancel: &CancellationToken,
) -> Result<RawResponse, OutcomeError>
where
    T: Transport + ?Sized,
{
    if policy.max_attempts == 0 {
        return Err(OutcomeError::RequestFailed(TransportError::new(
            TransportErrorKind::NoAttempts,
            "retry budget allows no attempts",
        )));
    }

    let mut attempts = 0u32;
    loop {
        tracing::debug!(attempt = attempts + 1, max_attempts = policy.max_attempts, url = %request.url, "sending request");
        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(TransportError::cancelled()),
            outcome = transport.send(request) => outcome,
        };

        let cause = match outcome {
            Ok(response) => return Ok(response),
            Err(cause) if !cause.kind.is_retryable() => {
                tracing::error!(error = %cause, url = %request.url, "request failed, not retryable");
                return Err(OutcomeError::RequestFailed(cause));
            }
            Err(cause) => cause,
        };

        attempts += 1;
        if attempts >= policy.max_attempts {
            tracing::error!(attempts, error = %cause, url = %request.url, "request failed, attempts exhausted");
            return Err(OutcomeError::RequestFailed(cause));
        }

        tracing::warn!(
            attempt = attempts,
            error = %cause,
            delay_ms = policy.delay.as_millis() as u64,
            "transport failure, retrying"
        );
        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                return Err(OutcomeError::RequestFailed(TransportError::cancelled()));
            }
            _ = tokio::time::sleep(policy.delay) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::time::Instant;

    use super::*;
    use crate::endpoint::EndpointDescriptor;
    use crate::request::build;
    use crate::transport::ScriptedTransport;

    fn request() -> PreparedRequest {
        build(&EndpointDescriptor::new("example.com", "/")).unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn success_on_first_attempt_does_not_sleep() {
        let transport = ScriptedTransport::always(RawResponse::json(200, "{}"));
        let start = Instant::now();

        let response = execute(&request(), &RetryPolicy::default(), &transport, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(response.status, Some(200));
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn succeeds_on_last_attempt_after_n_minus_one_delays() {
        for n in 1..=5u32 {
            let transport = ScriptedTransport::failing_then(
                n - 1,
                TransportError::timeout("timed out"),
                RawResponse::json(200, "{}"),
            );
            let policy = RetryPolicy::new(n, DEFAULT_RETRY_DELAY);
            let start = Instant::now();

            let response = execute(&request(), &policy, &transport, &CancellationToken::new())
                .await
                .unwrap();

            assert_eq!(response.status, Some(200));
            assert_eq!(transport.calls(), n as usize);
            assert_eq!(start.elapsed(), DEFAULT_RETRY_DELAY * (n - 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn always_failing_stops_at_max_attempts() {
        for n in 1..=4u32 {
            let transport = ScriptedTransport::always_failing(TransportError::connect("refused"));
            let policy = RetryPolicy::new(n, Duration::from_millis(250));
            let start = Instant::now();

            let err = execute(&request(), &policy, &transport, &CancellationToken::new())
                .await
                .unwrap_err();

            assert_eq!(err, OutcomeError::RequestFailed(TransportError::connect("")));
            assert_eq!(transport.calls(), n as usize);
            // No delay after the final failure.
            assert_eq!(start.elapsed(), Duration::from_millis(250) * (n - 1));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn reports_last_cause() {
        let transport = ScriptedTransport::new([
            Err(TransportError::connect("refused")),
            Err(TransportError::timeout("slow")),
        ]);
        let policy = RetryPolicy::new(2, DEFAULT_RETRY_DELAY);

        let err = execute(&request(), &policy, &transport, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(err, OutcomeError::RequestFailed(TransportError::timeout("")));
    }

    #[tokio::test(start_paused = true)]
    async fn http_error_statuses_are_not_retried() {
        for status in [404, 500, 503] {
            let transport = ScriptedTransport::always(RawResponse::json(status, ""));
            let response = execute(&request(), &RetryPolicy::default(), &transport, &CancellationToken::new())
                .await
                .unwrap();
            assert_eq!(response.status, Some(status));
            assert_eq!(transport.calls(), 1);
        }
    }

    #[tokio::test]
    async fn zero_attempts_fails_without_sending() {
        let transport = ScriptedTransport::always(RawResponse::json(200, "{}"));
        let policy = RetryPolicy::new(0, DEFAULT_RETRY_DELAY);

        let err = execute(&request(), &policy, &transport, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            OutcomeError::RequestFailed(TransportError::new(TransportErrorKind::NoAttempts, ""))
        );
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test]
    async fn cancelled_before_start_fails_immediately() {
        let transport = ScriptedTransport::always(RawResponse::json(200, "{}"));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = execute(&request(), &RetryPolicy::default(), &transport, &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, OutcomeError::RequestFailed(TransportError::cancelled()));
        assert_eq!(transport.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn invalid_request_is_not_retried() {
        let transport = ScriptedTransport::always_failing(TransportError::new(
            TransportErrorKind::InvalidRequest,
            "invalid HTTP header name",
        ));
        let start = Instant::now();

        let err = execute(&request(), &RetryPolicy::default(), &transport, &CancellationToken::new())
            .await
            .unwrap_err();

        assert_eq!(
            err,
            OutcomeError::RequestFailed(TransportError::new(TransportErrorKind::InvalidRequest, ""))
        );
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::ZERO);
    }

    /// Never completes a send.
    struct Hanging;

    #[async_trait::async_trait]
    impl Transport for Hanging {
        async fn send(&self, _request: &PreparedRequest) -> Result<RawResponse, TransportError> {
            std::future::pending().await
        }
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_in_flight_send() {
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            trigger.cancel();
        });
        let start = Instant::now();

        let err = execute(&request(), &RetryPolicy::default(), &Hanging, &cancel)
            .await
            .unwrap_err();

        match err {
            OutcomeError::RequestFailed(cause) => assert_eq!(cause.kind, TransportErrorKind::Cancelled),
            other => panic!("expected RequestFailed, got {other:?}"),
        }
        assert_eq!(start.elapsed(), Duration::from_millis(300));
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_retry_delay() {
        let transport = ScriptedTransport::always_failing(TransportError::timeout("slow"));
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(500)).await;
            trigger.cancel();
        });
        let start = Instant::now();

        let err = execute(&request(), &RetryPolicy::default(), &transport, &cancel)
            .await
            .unwrap_err();

        assert_eq!(err, OutcomeError::RequestFailed(TransportError::cancelled()));
        assert_eq!(transport.calls(), 1);
        assert_eq!(start.elapsed(), Duration::from_millis(500));
    }
}
