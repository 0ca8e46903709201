//! Transport trait definition

use async_trait::async_trait;

use super::types::{Response, TransportError};

/// Trait for issuing requests against the target host
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue one GET for `path` (absolute, e.g. `/test-channel/1`).
    /// Resolves once the response headers arrive; the body is read by the caller.
    async fn get(&self, path: &str) -> Result<Response, TransportError>;

    /// Base host this transport targets, for display
    fn host(&self) -> &str;
}
