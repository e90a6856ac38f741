//! Request-execution core for declarative HTTP endpoints.
//!
//! # Overview
//! An [`EndpointDescriptor`] describes one request. The pipeline builds it
//! into a [`PreparedRequest`], sends it through a pluggable [`Transport`]
//! with bounded retry, classifies the response status and decodes a JSON
//! body into the caller's type. Every failure is one [`OutcomeError`].
//!
//! # Design
//! - Building, classifying and decoding are pure functions over plain data;
//!   only [`retry::execute`] performs I/O, and only through the transport.
//! - Retry covers transport failures alone. Any completed exchange, whatever
//!   its status, goes straight to the classifier.
//! - The transport is the only shared state between concurrent requests.

pub mod client;
pub mod config;
pub mod decode;
pub mod endpoint;
pub mod error;
pub mod http;
pub mod request;
pub mod response;
pub mod retry;
pub mod transport;

pub use client::{NetworkClient, Pipeline, Stage};
pub use config::{ClientConfig, ConfigError};
pub use decode::{decode, is_json_content_type};
pub use endpoint::{CachePolicy, EndpointDescriptor};
pub use error::{DecodeError, ErrorKind, OutcomeError, TransportError, TransportErrorKind};
pub use http::{HttpMethod, PreparedRequest, RawResponse};
pub use request::build;
pub use response::{classify, Verdict};
pub use retry::{execute, RetryPolicy};
pub use tokio_util::sync::CancellationToken;
pub use transport::{ScriptedTransport, Transport};
#[cfg(feature = "ureq-transport")]
pub use transport::UreqTransport;
