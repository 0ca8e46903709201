//! Transport module for reaching the target host
//!
//! This module provides:
//! - `Transport` trait for abstracting how a GET reaches the target
//! - `HttpTransport` backed by a shared `reqwest::Client`

mod http;
mod service;
mod types;

pub use http::HttpTransport;
pub use service::Transport;
pub use types::{BodyStream, HttpSettings, Response, TransportError};
