//! Error types for the request pipeline.
//!
//! # Design
//! `OutcomeError` is the closed set of ways a request can end without a
//! decoded value. Every variant is terminal. Wrapped causes (transport and
//! parse failures) compare by category only: two timeouts are equal even if
//! their messages differ, which is what callers and tests care about.

use serde_json::error::Category;

/// Terminal failure of a request.
#[derive(Debug, thiserror::Error)]
pub enum OutcomeError {
    /// The descriptor could not be assembled into a URL.
    #[error("endpoint does not form a valid URL")]
    BadUrl,

    /// The transport returned something without a usable status line.
    #[error("response carried no usable HTTP status")]
    InvalidResponse,

    /// The server returned 404.
    #[error("resource not found")]
    NotFound,

    /// The server returned 500.
    #[error("internal server error")]
    InternalServerError,

    /// The server returned a status that is neither 2xx, 404 nor 500.
    #[error("unexpected HTTP status {status_code}")]
    UnknownError { status_code: u16 },

    /// The response content type is not JSON.
    #[error("unsupported response content type")]
    UnsupportedContentType,

    /// Every transport attempt failed; carries the last cause.
    #[error("request failed: {0}")]
    RequestFailed(#[source] TransportError),

    /// The body did not parse into the requested type.
    #[error("decoding failed: {0}")]
    DecodingFailed(#[source] DecodeError),
}

/// Fieldless tag for an [`OutcomeError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    BadUrl,
    InvalidResponse,
    NotFound,
    InternalServerError,
    UnknownError,
    UnsupportedContentType,
    RequestFailed,
    DecodingFailed,
}

impl OutcomeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            OutcomeError::BadUrl => ErrorKind::BadUrl,
            OutcomeError::InvalidResponse => ErrorKind::InvalidResponse,
            OutcomeError::NotFound => ErrorKind::NotFound,
            OutcomeError::InternalServerError => ErrorKind::InternalServerError,
            OutcomeError::UnknownError { .. } => ErrorKind::UnknownError,
            OutcomeError::UnsupportedContentType => ErrorKind::UnsupportedContentType,
            OutcomeError::RequestFailed(_) => ErrorKind::RequestFailed,
            OutcomeError::DecodingFailed(_) => ErrorKind::DecodingFailed,
        }
    }
}

impl PartialEq for OutcomeError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (
                OutcomeError::UnknownError { status_code: a },
                OutcomeError::UnknownError { status_code: b },
            ) => a == b,
            (OutcomeError::RequestFailed(a), OutcomeError::RequestFailed(b)) => a == b,
            (OutcomeError::DecodingFailed(a), OutcomeError::DecodingFailed(b)) => a == b,
            _ => self.kind() == other.kind(),
        }
    }
}

impl Eq for OutcomeError {}

/// Why the transport could not complete an exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransportErrorKind {
    Timeout,
    /// Name resolution or connection establishment failed.
    Connect,
    Io,
    /// The caller cancelled the request.
    Cancelled,
    /// The retry budget allowed no attempt at all.
    NoAttempts,
    /// The request could not be encoded for the wire, e.g. an invalid
    /// header name. Sending it again fails the same way.
    InvalidRequest,
    Other,
}

impl TransportErrorKind {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            TransportErrorKind::Cancelled | TransportErrorKind::NoAttempts | TransportErrorKind::InvalidRequest
        )
    }
}

/// A failed exchange as reported by a transport.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{kind:?}: {message}")]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub message: String,
}

impl TransportError {
    pub fn new(kind: TransportErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, message)
    }

    pub fn connect(message: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Connect, message)
    }

    pub fn cancelled() -> Self {
        Self::new(TransportErrorKind::Cancelled, "request cancelled")
    }
}

/// Transport errors compare by kind only.
impl PartialEq for TransportError {
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
    }
}

impl Eq for TransportError {}

/// A body that failed to deserialize.
#[derive(Debug, thiserror::Error)]
#[error(transparent)]
pub struct DecodeError(#[from] serde_json::Error);

impl DecodeError {
    pub fn category(&self) -> Category {
        self.0.classify()
    }

    pub fn inner(&self) -> &serde_json::Error {
        &self.0
    }
}

/// Decode errors compare by serde_json category only.
impl PartialEq for DecodeError {
    fn eq(&self, other: &Self) -> bool {
        self.category() == other.category()
    }
}

impl Eq for DecodeError {}
