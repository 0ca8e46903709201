//! reqwest-backed transport
//!
//! One `reqwest::Client` is shared by every simulated client, so the
//! connection pool is owned by the engine rather than by each task.

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::redirect::Policy;

use super::service::Transport;
use super::types::{HttpSettings, Response, TransportError};

/// HTTP transport bound to a single base host
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
}

impl HttpTransport {
    /// Create a transport for `base_url` (e.g. `http://localhost:8000`)
    pub fn new(base_url: &str, settings: &HttpSettings) -> Result<Self, TransportError> {
        let base_url = normalize_base_url(base_url)?;

        // Redirects are not followed: each action is exactly one GET on the wire
        let mut builder = Client::builder().redirect(Policy::none());
        if let Some(timeout) = settings.request_timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(TransportError::Build)?;

        Ok(Self { client, base_url })
    }

    /// Full URL for a task path
    pub fn url_for(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn get(&self, path: &str) -> Result<Response, TransportError> {
        let url = self.url_for(path);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status().as_u16();
        let body = resp.bytes_stream().map(|chunk| chunk.map_err(TransportError::from));

        Ok(Response::new(status, Box::pin(body)))
    }

    fn host(&self) -> &str {
        &self.base_url
    }
}

fn normalize_base_url(base_url: &str) -> Result<String, TransportError> {
    let trimmed = base_url.trim();
    if !(trimmed.starts_with("http://") || trimmed.starts_with("https://")) {
        return Err(TransportError::InvalidBaseUrl(base_url.to_string()));
    }
    let trimmed = trimmed.trim_end_matches('/');
    if trimmed.ends_with(':') || trimmed.ends_with("//") {
        return Err(TransportError::InvalidBaseUrl(base_url.to_string()));
    }
    Ok(trimmed.to_string())
}

fn join_url(base_url: &str, path: &str) -> String {
    if path.starts_with('/') {
        format!("{}{}", base_url, path)
    } else {
        format!("{}/{}", base_url, path)
    }
}
