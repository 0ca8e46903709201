//! Common Test Utilities for Integration Tests
//!
//! Shared helpers used across integration test modules: a mock target
//! server that records every request it receives.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::Router;
use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use tokio::task::JoinHandle;

/// A request as seen by the mock target
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub headers: HeaderMap,
    pub body: Bytes,
}

#[derive(Clone)]
enum Reply {
    Status(StatusCode),
    EventStream(&'static str),
    EndlessStream,
}

#[derive(Clone)]
struct TargetState {
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    reply: Reply,
}

/// Mock target running on an ephemeral port; stopped on drop
pub struct RunningTarget {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    handle: JoinHandle<()>,
}

impl RunningTarget {
    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url(), path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl Drop for RunningTarget {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn record(
    State(state): State<TargetState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        query: uri.query().map(|q| q.to_string()),
        headers,
        body,
    });

    match state.reply {
        Reply::Status(status) if status.is_redirection() => {
            let mut response = (status, "").into_response();
            response
                .headers_mut()
                .insert(header::LOCATION, HeaderValue::from_static("/redirected"));
            response
        }
        Reply::Status(status) => (status, "frodo").into_response(),
        Reply::EventStream(body) => {
            ([(header::CONTENT_TYPE, "text/event-stream")], body).into_response()
        }
        Reply::EndlessStream => {
            let stream = futures_util::stream::unfold(0u64, |n| async move {
                tokio::time::sleep(Duration::from_millis(20)).await;
                let event = Bytes::from(format!("data: {}\n\n", n));
                Some((Ok::<_, std::io::Error>(event), n + 1))
            });
            (
                [(header::CONTENT_TYPE, "text/event-stream")],
                Body::from_stream(stream),
            )
                .into_response()
        }
    }
}

async fn start(reply: Reply) -> RunningTarget {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = TargetState {
        requests: requests.clone(),
        reply,
    };
    let app = Router::new().fallback(record).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    RunningTarget {
        addr,
        requests,
        handle,
    }
}

/// Target that answers every request with `status`
pub async fn start_target(status: StatusCode) -> RunningTarget {
    start(Reply::Status(status)).await
}

/// Target that answers every request with a finite event-stream body
pub async fn start_stream_target(body: &'static str) -> RunningTarget {
    start(Reply::EventStream(body)).await
}

/// Target that emits an event every 20ms and never closes the stream
pub async fn start_endless_stream_target() -> RunningTarget {
    start(Reply::EndlessStream).await
}

/// An address nothing is listening on
pub async fn unused_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}
