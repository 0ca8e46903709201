//! Event-stream stressor
//!
//! Opens many long-lived GET connections against a single event-stream URL,
//! one every `spacing`, and reads each response line by line until the
//! server closes it. Useful for checking how many concurrent subscribers a
//! channel can hold, as opposed to the request throughput measured by `run`.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::BytesMut;
use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONNECTION;
use tokio::sync::watch;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::engine::wait_for_stop;
use crate::transport::TransportError;

/// Settings for a stream run
#[derive(Debug, Clone)]
pub struct StreamSettings {
    /// Event-stream URL every connection subscribes to
    pub url: String,
    /// Number of connections to open
    pub connections: usize,
    /// Delay between opening two connections
    pub spacing: Duration,
    /// Stop after this long (`None` = until every stream ends or Ctrl+C)
    pub run_time: Option<Duration>,
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:3000/talk-state/123456".to_string(),
            connections: 10,
            spacing: Duration::from_millis(15),
            run_time: None,
        }
    }
}

/// Totals for a stream run
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct StreamSummary {
    /// Connections that got a response
    pub opened: u64,
    /// Connections that never got a response
    pub failed: u64,
    /// Lines read across all connections
    pub lines: u64,
    /// Body bytes read across all connections
    pub bytes: u64,
}

#[derive(Debug, Default)]
struct StreamCounters {
    opened: AtomicU64,
    failed: AtomicU64,
    lines: AtomicU64,
    bytes: AtomicU64,
}

impl StreamCounters {
    fn summary(&self) -> StreamSummary {
        StreamSummary {
            opened: self.opened.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            lines: self.lines.load(Ordering::SeqCst),
            bytes: self.bytes.load(Ordering::SeqCst),
        }
    }
}

/// Splits a byte stream into `\n`-terminated lines
#[derive(Debug, Default)]
struct LineBuffer {
    buf: BytesMut,
    /// Bytes of `buf` already known to hold no newline
    scanned: usize,
}

impl LineBuffer {
    /// Append a chunk and return every line it completed
    fn push(&mut self, chunk: &[u8]) -> Vec<String> {
        self.buf.extend_from_slice(chunk);

        let mut lines = Vec::new();
        while let Some(offset) = self.buf[self.scanned..].iter().position(|b| *b == b'\n') {
            let pos = self.scanned + offset;
            let line = self.buf.split_to(pos + 1);
            lines.push(decode_line(&line[..pos]));
            self.scanned = 0;
        }
        self.scanned = self.buf.len();
        lines
    }

    /// Whatever is left once the stream ends
    fn finish(&mut self) -> Option<String> {
        if self.buf.is_empty() {
            return None;
        }
        let rest = self.buf.split();
        self.scanned = 0;
        Some(decode_line(&rest))
    }
}

fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw)
        .trim_end_matches('\r')
        .to_string()
}

/// Open `connections` streams and read them until they end, the run time
/// elapses, or `shutdown` fires
pub async fn run_stream(
    settings: &StreamSettings,
    mut shutdown: watch::Receiver<bool>,
) -> Result<StreamSummary, TransportError> {
    if !(settings.url.starts_with("http://") || settings.url.starts_with("https://")) {
        return Err(TransportError::InvalidBaseUrl(settings.url.clone()));
    }
    let client = Client::builder().build().map_err(TransportError::Build)?;
    let counters = Arc::new(StreamCounters::default());

    info!(
        "Opening {} streams to {} ({:?} apart)",
        settings.connections, settings.url, settings.spacing
    );

    let run_time = settings.run_time;
    let deadline = async move {
        match run_time {
            Some(run_time) => tokio::time::sleep(run_time).await,
            None => std::future::pending::<()>().await,
        }
    };
    tokio::pin!(deadline);

    let mut streams = JoinSet::new();
    let mut stopped = false;

    for index in 0..settings.connections {
        if index > 0 {
            tokio::select! {
                _ = tokio::time::sleep(settings.spacing) => {}
                _ = &mut deadline => { stopped = true; }
                _ = wait_for_stop(&mut shutdown) => { stopped = true; }
            }
            if stopped {
                break;
            }
        }
        streams.spawn(read_stream(
            client.clone(),
            settings.url.clone(),
            index,
            counters.clone(),
        ));
    }

    if !stopped {
        tokio::select! {
            _ = async { while streams.join_next().await.is_some() {} } => {
                debug!("Every stream has ended");
            }
            _ = &mut deadline => info!("Run time elapsed, closing streams"),
            _ = wait_for_stop(&mut shutdown) => info!("Shutdown requested, closing streams"),
        }
    }
    streams.abort_all();

    let summary = counters.summary();
    info!(
        "Streams finished: {} opened, {} failed, {} lines, {} bytes",
        summary.opened, summary.failed, summary.lines, summary.bytes
    );
    Ok(summary)
}

async fn read_stream(client: Client, url: String, index: usize, counters: Arc<StreamCounters>) {
    let resp = match client.get(&url).header(CONNECTION, "keep-alive").send().await {
        Ok(resp) => resp,
        Err(e) => {
            warn!(connection = index, "Failed to open stream: {}", e);
            counters.failed.fetch_add(1, Ordering::SeqCst);
            return;
        }
    };
    counters.opened.fetch_add(1, Ordering::SeqCst);
    debug!(connection = index, status = resp.status().as_u16(), "Stream opened");

    let mut body = resp.bytes_stream();
    let mut lines = LineBuffer::default();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(chunk) => {
                counters
                    .bytes
                    .fetch_add(chunk.len() as u64, Ordering::SeqCst);
                for line in lines.push(&chunk) {
                    counters.lines.fetch_add(1, Ordering::SeqCst);
                    info!(connection = index, "{}", line);
                }
            }
            Err(e) => {
                warn!(connection = index, "Stream read failed: {}", e);
                break;
            }
        }
    }

    if let Some(line) = lines.finish() {
        counters.lines.fetch_add(1, Ordering::SeqCst);
        info!(connection = index, "{}", line);
    }
    debug!(connection = index, "Stream closed");
}
