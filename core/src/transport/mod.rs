//! The transport boundary.
//!
//! # Design
//! A transport performs exactly one network exchange per `send`. Anything
//! that stops the exchange from completing is a `TransportError` and is
//! eligible for retry; a completed exchange is returned as a `RawResponse`
//! whatever its status. Connection reuse, pooling and caching belong to the
//! implementation, which must be safe to share between concurrent requests.

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::http::{PreparedRequest, RawResponse};

pub mod stub;
#[cfg(feature = "ureq-transport")]
pub mod ureq_agent;

pub use stub::ScriptedTransport;
#[cfg(feature = "ureq-transport")]
pub use ureq_agent::UreqTransport;

#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for Arc<T> {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        (**self).send(request).await
    }
}

#[async_trait]
impl<T: Transport + ?Sized> Transport for &T {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        (**self).send(request).await
    }
}
