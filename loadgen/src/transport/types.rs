//! Transport types and error definitions

use std::fmt;
use std::pin::Pin;

use bytes::Bytes;
use futures_util::Stream;
use thiserror::Error;

/// Errors that can occur when talking to the target host
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Failed to build HTTP client: {0}")]
    Build(#[source] reqwest::Error),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Body chunks as they arrive; may never end for event-stream channels
pub type BodyStream = Pin<Box<dyn Stream<Item = Result<Bytes, TransportError>> + Send>>;

/// A response whose headers have arrived and whose body is still on the wire
pub struct Response {
    /// HTTP status code
    pub status: u16,
    pub body: BodyStream,
}

impl Response {
    pub fn new(status: u16, body: BodyStream) -> Self {
        Self { status, body }
    }

    /// Response with no body at all
    pub fn empty(status: u16) -> Self {
        Self::new(status, Box::pin(futures_util::stream::empty()))
    }

    /// Response whose whole body is `body`
    pub fn full(status: u16, body: impl Into<Bytes>) -> Self {
        let chunk: Result<Bytes, TransportError> = Ok(body.into());
        Self::new(status, Box::pin(futures_util::stream::iter([chunk])))
    }
}

impl fmt::Debug for Response {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Response")
            .field("status", &self.status)
            .finish_non_exhaustive()
    }
}

/// Settings for the HTTP transport
#[derive(Debug, Clone, Default)]
pub struct HttpSettings {
    /// Per-request timeout; `None` keeps the client default (no timeout)
    pub request_timeout: Option<std::time::Duration>,
}
