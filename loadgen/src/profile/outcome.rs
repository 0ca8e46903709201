//! Executing a task and the outcome it reports

use std::fmt;
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::sync::watch;
use tracing::debug;

use super::types::Task;
use crate::engine::wait_for_stop;
use crate::transport::{BodyStream, Transport};

/// What the target actually did with a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Observed {
    /// The server answered with this status code
    Status(u16),
    /// The request never produced a response
    ConnectionError(String),
}

impl Observed {
    /// Key used in the observed-status breakdown
    pub fn label(&self) -> String {
        match self {
            Observed::Status(code) => code.to_string(),
            Observed::ConnectionError(_) => "connection_error".to_string(),
        }
    }
}

impl fmt::Display for Observed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Observed::Status(code) => write!(f, "HTTP {}", code),
            Observed::ConnectionError(message) => write!(f, "connection error: {}", message),
        }
    }
}

/// Result of one task invocation, as reported to the statistics pipeline
#[derive(Debug, Clone)]
pub struct TaskOutcome {
    pub task: String,
    /// Time until the response headers (or the connection error) arrived
    pub latency: Duration,
    pub observed: Observed,
    /// Body bytes read before the body ended or the run stopped
    pub bytes: u64,
}

impl TaskOutcome {
    /// Every attempt counts as a success, whatever the server returned.
    /// Known limitation: server errors never show up as failures.
    pub fn success(&self) -> bool {
        true
    }
}

impl Task {
    /// Issue exactly one GET for this task's path and read its body.
    ///
    /// Event-stream channels never end their body, so reading stops when
    /// `stop` fires; the outcome still counts. Returns `None` only if `stop`
    /// fires before the response headers arrive.
    pub async fn execute(
        &self,
        transport: &dyn Transport,
        stop: &mut watch::Receiver<bool>,
    ) -> Option<TaskOutcome> {
        let start = Instant::now();
        let result = tokio::select! {
            result = transport.get(&self.path) => result,
            _ = wait_for_stop(stop) => {
                debug!(task = %self.name, "Stopped before response headers");
                return None;
            }
        };
        let latency = start.elapsed();

        let (observed, bytes) = match result {
            Ok(resp) => (Observed::Status(resp.status), drain(resp.body, stop).await),
            Err(e) => (Observed::ConnectionError(e.to_string()), 0),
        };
        debug!(task = %self.name, path = %self.path, ?latency, bytes, "{}", observed);

        Some(TaskOutcome {
            task: self.name.clone(),
            latency,
            observed,
            bytes,
        })
    }
}

/// Read `body` until it ends, fails or `stop` fires; returns the bytes read
async fn drain(mut body: BodyStream, stop: &mut watch::Receiver<bool>) -> u64 {
    let mut bytes = 0u64;
    loop {
        tokio::select! {
            chunk = body.next() => match chunk {
                Some(Ok(chunk)) => bytes += chunk.len() as u64,
                Some(Err(e)) => {
                    debug!("Body read failed: {}", e);
                    break;
                }
                None => break,
            },
            _ = wait_for_stop(stop) => break,
        }
    }
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{Response, TransportError};
    use async_trait::async_trait;
    use bytes::Bytes;
    use futures_util::stream;
    use std::sync::Mutex;

    /// Answers every GET with a fixed status, or fails the connection
    struct FixedTransport {
        status: Option<u16>,
        paths: Mutex<Vec<String>>,
    }

    impl FixedTransport {
        fn new(status: Option<u16>) -> Self {
            Self {
                status,
                paths: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl Transport for FixedTransport {
        async fn get(&self, path: &str) -> Result<Response, TransportError> {
            self.paths.lock().unwrap().push(path.to_string());
            match self.status {
                Some(status) => Ok(Response::full(status, "hello")),
                None => Err(TransportError::InvalidBaseUrl("refused".to_string())),
            }
        }

        fn host(&self) -> &str {
            "http://fixed"
        }
    }

    /// Sends one event, then keeps the body open forever
    struct EndlessTransport;

    #[async_trait]
    impl Transport for EndlessTransport {
        async fn get(&self, _path: &str) -> Result<Response, TransportError> {
            let first: Result<Bytes, TransportError> = Ok(Bytes::from_static(b"data: x\n\n"));
            let body = stream::iter([first]).chain(stream::pending());
            Ok(Response::new(200, Box::pin(body)))
        }

        fn host(&self) -> &str {
            "http://endless"
        }
    }

    /// Never answers
    struct SilentTransport;

    #[async_trait]
    impl Transport for SilentTransport {
        async fn get(&self, _path: &str) -> Result<Response, TransportError> {
            std::future::pending().await
        }

        fn host(&self) -> &str {
            "http://silent"
        }
    }

    fn running() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    #[tokio::test]
    async fn test_execute_issues_one_get_to_task_path() {
        let transport = FixedTransport::new(Some(200));
        let task = Task::new("ch_3", "/test-channel/3", 4);
        let (_stop_tx, mut stop) = running();

        let outcome = task.execute(&transport, &mut stop).await.unwrap();

        assert_eq!(*transport.paths.lock().unwrap(), vec!["/test-channel/3"]);
        assert_eq!(outcome.task, "ch_3");
        assert_eq!(outcome.observed, Observed::Status(200));
        assert_eq!(outcome.bytes, 5);
    }

    #[tokio::test]
    async fn test_every_status_is_reported_as_success() {
        let task = Task::new("ch_1", "/test-channel/1", 2);
        let (_stop_tx, mut stop) = running();
        for status in [200, 404, 500] {
            let transport = FixedTransport::new(Some(status));
            let outcome = task.execute(&transport, &mut stop).await.unwrap();
            assert_eq!(outcome.observed, Observed::Status(status));
            assert!(outcome.success(), "status {} should be a success", status);
        }
    }

    #[tokio::test]
    async fn test_connection_error_is_reported_as_success() {
        let transport = FixedTransport::new(None);
        let task = Task::new("ch_4", "/test-channel/4", 1);
        let (_stop_tx, mut stop) = running();

        let outcome = task.execute(&transport, &mut stop).await.unwrap();

        assert!(matches!(outcome.observed, Observed::ConnectionError(_)));
        assert_eq!(outcome.observed.label(), "connection_error");
        assert_eq!(outcome.bytes, 0);
        assert!(outcome.success());
    }

    #[tokio::test]
    async fn test_stop_ends_a_body_that_never_closes() {
        let task = Task::new("ch_2", "/test-channel/2", 1);
        let (stop_tx, mut stop) = running();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            let _ = stop_tx.send(true);
        });
        let outcome = tokio::time::timeout(
            Duration::from_secs(5),
            task.execute(&EndlessTransport, &mut stop),
        )
        .await
        .expect("stop should end the body read")
        .unwrap();

        assert_eq!(outcome.observed, Observed::Status(200));
        assert_eq!(outcome.bytes, 9);
        assert!(outcome.latency < Duration::from_millis(50));
    }

    #[tokio::test]
    async fn test_stop_before_headers_drops_the_attempt() {
        let task = Task::new("ch_1", "/test-channel/1", 2);
        let (stop_tx, mut stop) = running();
        stop_tx.send(true).unwrap();

        let outcome = task.execute(&SilentTransport, &mut stop).await;

        assert!(outcome.is_none());
    }
}
