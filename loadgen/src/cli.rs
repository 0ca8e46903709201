//! Command line interface

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::config::Config;

/// Frodo load generator
#[derive(Parser, Debug)]
#[command(name = "frodo-loadgen")]
#[command(about = "Weighted HTTP load generator for Frodo test channels")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Run the weighted channel profile against a host
    Run(RunArgs),

    /// List the tasks of the channel profile with their weights
    Tasks,

    /// Open long-lived event-stream connections and read them
    Stream(StreamArgs),
}

/// Flags for `run`; anything left unset keeps its environment/default value
#[derive(Args, Debug, Clone, Default)]
pub struct RunArgs {
    /// Target base host, e.g. http://localhost:8000
    #[arg(long)]
    pub host: Option<String>,

    /// Number of simulated clients
    #[arg(short, long)]
    pub users: Option<usize>,

    /// Simulated clients started per second
    #[arg(short = 'r', long)]
    pub spawn_rate: Option<f64>,

    /// Stop after this many seconds
    #[arg(short = 't', long)]
    pub run_time: Option<u64>,

    /// Stop after this many task selections across all clients
    #[arg(short, long)]
    pub iterations: Option<u64>,

    /// Minimum pause between tasks in milliseconds
    #[arg(long)]
    pub wait_min_ms: Option<u64>,

    /// Maximum pause between tasks in milliseconds
    #[arg(long)]
    pub wait_max_ms: Option<u64>,

    /// Seed for reproducible task selection
    #[arg(long)]
    pub seed: Option<u64>,

    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    pub request_timeout: Option<u64>,

    /// Progress logging interval in seconds
    #[arg(long)]
    pub report_interval: Option<u64>,

    /// Write the final report as JSON to this file
    #[arg(long)]
    pub json_report: Option<PathBuf>,

    /// Serve Prometheus metrics on this address, e.g. 127.0.0.1:9100
    #[arg(long)]
    pub metrics_addr: Option<SocketAddr>,
}

impl RunArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref host) = self.host {
            config.host = host.clone();
        }
        if let Some(users) = self.users {
            config.engine.users = users;
        }
        if let Some(rate) = self.spawn_rate {
            config.engine.spawn_rate = rate;
        }
        if let Some(secs) = self.run_time {
            config.engine.run_time = Some(Duration::from_secs(secs));
        }
        if let Some(iterations) = self.iterations {
            config.engine.iterations = Some(iterations);
        }
        if let Some(ms) = self.wait_min_ms {
            config.engine.wait.min = Duration::from_millis(ms);
        }
        if let Some(ms) = self.wait_max_ms {
            config.engine.wait.max = Duration::from_millis(ms);
        }
        if let Some(seed) = self.seed {
            config.engine.seed = Some(seed);
        }
        if let Some(secs) = self.request_timeout {
            config.http.request_timeout = Some(Duration::from_secs(secs));
        }
        if let Some(secs) = self.report_interval {
            config.engine.report_interval = Duration::from_secs(secs);
        }
        if let Some(ref path) = self.json_report {
            config.json_report = Some(path.clone());
        }
        if let Some(addr) = self.metrics_addr {
            config.metrics_addr = Some(addr);
        }
    }
}

/// Flags for `stream`
#[derive(Args, Debug, Clone, Default)]
pub struct StreamArgs {
    /// Event-stream URL
    pub url: Option<String>,

    /// Number of connections to open
    pub connections: Option<usize>,

    /// Delay between opening two connections, in milliseconds
    #[arg(long)]
    pub spacing_ms: Option<u64>,

    /// Stop after this many seconds
    #[arg(short = 't', long)]
    pub run_time: Option<u64>,
}

impl StreamArgs {
    pub fn apply(&self, config: &mut Config) {
        if let Some(ref url) = self.url {
            config.stream.url = url.clone();
        }
        if let Some(connections) = self.connections {
            config.stream.connections = connections;
        }
        if let Some(ms) = self.spacing_ms {
            config.stream.spacing = Duration::from_millis(ms);
        }
        if let Some(secs) = self.run_time {
            config.stream.run_time = Some(Duration::from_secs(secs));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_flags_override_config() {
        let cli = Cli::try_parse_from([
            "frodo-loadgen",
            "run",
            "--host",
            "http://localhost:9000",
            "-u",
            "20",
            "-r",
            "5",
            "-i",
            "10",
            "--wait-min-ms",
            "0",
            "--wait-max-ms",
            "50",
        ])
        .unwrap();

        let Command::Run(args) = cli.command else {
            panic!("expected run subcommand");
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.host, "http://localhost:9000");
        assert_eq!(config.engine.users, 20);
        assert_eq!(config.engine.spawn_rate, 5.0);
        assert_eq!(config.engine.iterations, Some(10));
        assert_eq!(config.engine.wait.min, Duration::ZERO);
        assert_eq!(config.engine.wait.max, Duration::from_millis(50));
        assert!(config.engine.run_time.is_none());
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let mut config = Config::default();
        config.engine.users = 7;
        RunArgs::default().apply(&mut config);
        assert_eq!(config.engine.users, 7);
        assert_eq!(config.host, "http://localhost:8000");
    }

    #[test]
    fn test_stream_positional_arguments() {
        let cli = Cli::try_parse_from([
            "frodo-loadgen",
            "stream",
            "http://localhost:3000/talk-state/1",
            "25",
        ])
        .unwrap();

        let Command::Stream(args) = cli.command else {
            panic!("expected stream subcommand");
        };
        let mut config = Config::default();
        args.apply(&mut config);

        assert_eq!(config.stream.url, "http://localhost:3000/talk-state/1");
        assert_eq!(config.stream.connections, 25);
    }

    #[test]
    fn test_verbose_is_global() {
        let cli = Cli::try_parse_from(["frodo-loadgen", "tasks", "-v"]).unwrap();
        assert!(cli.verbose);
        assert!(matches!(cli.command, Command::Tasks));
    }
}
