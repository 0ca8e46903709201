//! Frodo Load Generator Library
//!
//! This module exports the load generator components for use in integration
//! tests and external tooling.

pub mod cli;
pub mod config;
pub mod engine;
pub mod profile;
pub mod report;
pub mod stream;
pub mod telemetry;
pub mod transport;

// Re-export commonly used types
pub use config::Config;
pub use engine::{Engine, EngineSettings, RunStats, WaitTime};
pub use profile::{Observed, Task, TaskOutcome, TaskProfile};
pub use report::RunReport;
pub use stream::{StreamSettings, StreamSummary, run_stream};
pub use transport::{HttpSettings, HttpTransport, Transport};
