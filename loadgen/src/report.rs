//! Run reports: console summary and JSON output

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::engine::{RequestStats, RunStats};
use crate::profile::TaskProfile;

/// One row of the per-task table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskReport {
    pub name: String,
    pub path: String,
    pub weight: u32,
    pub requests: u64,
    pub failures: u64,
    /// Fraction of all requests that went to this task
    pub share: f64,
    /// Fraction implied by the weights
    pub expected_share: f64,
    pub bytes: u64,
    pub mean_ms: Option<f64>,
    pub min_ms: Option<f64>,
    pub max_ms: Option<f64>,
    pub p50_ms: Option<f64>,
    pub p95_ms: Option<f64>,
    pub p99_ms: Option<f64>,
}

/// Snapshot of a finished run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub started_at: DateTime<Utc>,
    pub profile: String,
    pub host: String,
    pub peak_users: usize,
    pub duration_secs: f64,
    pub total_requests: u64,
    pub total_failures: u64,
    pub total_bytes: u64,
    pub requests_per_sec: f64,
    pub p99_ms: Option<f64>,
    pub tasks: Vec<TaskReport>,
    /// Responses by observed status; informational only, never counted as failures
    pub observed: BTreeMap<String, u64>,
}

fn ms(d: Option<Duration>) -> Option<f64> {
    d.map(|d| d.as_secs_f64() * 1000.0)
}

impl RunReport {
    pub fn from_stats(
        stats: &RunStats,
        profile: &TaskProfile,
        host: &str,
        started_at: DateTime<Utc>,
    ) -> Self {
        let empty = RequestStats::default();
        let tasks = profile
            .tasks()
            .iter()
            .map(|task| {
                let row = stats.tasks.get(&task.name).unwrap_or(&empty);
                TaskReport {
                    name: task.name.clone(),
                    path: task.path.clone(),
                    weight: task.weight,
                    requests: row.requests,
                    failures: row.failures,
                    share: stats.share(&task.name).unwrap_or(0.0),
                    expected_share: profile.share(&task.name).unwrap_or(0.0),
                    bytes: row.bytes,
                    mean_ms: ms(row.latencies.mean()),
                    min_ms: ms(row.latencies.min()),
                    max_ms: ms(row.latencies.max()),
                    p50_ms: ms(row.latencies.p50()),
                    p95_ms: ms(row.latencies.p95()),
                    p99_ms: ms(row.latencies.p99()),
                }
            })
            .collect();

        Self {
            run_id: Uuid::new_v4(),
            started_at,
            profile: profile.name().to_string(),
            host: host.to_string(),
            peak_users: stats.peak_users,
            duration_secs: stats.duration.as_secs_f64(),
            total_requests: stats.total_requests(),
            total_failures: stats.total_failures(),
            total_bytes: stats.total_bytes(),
            requests_per_sec: stats.requests_per_sec(),
            p99_ms: ms(stats.aggregated_latencies().p99()),
            tasks,
            observed: stats.observed.clone(),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write the report as pretty JSON
    pub fn write_json(&self, path: &Path) -> std::io::Result<()> {
        let json = self.to_json()?;
        std::fs::write(path, json)
    }

    #[allow(clippy::print_literal)]
    pub fn print_summary(&self) {
        println!();
        println!("═══════════════════════════════════════════════════════════════════════");
        println!(" {} against {}", self.profile, self.host);
        println!(
            " {} users, {:.1}s, {} requests, {:.1} req/s, {} bytes read",
            self.peak_users,
            self.duration_secs,
            self.total_requests,
            self.requests_per_sec,
            self.total_bytes
        );
        println!("═══════════════════════════════════════════════════════════════════════");
        println!();
        println!(
            "   {:6} {:18} {:>6} {:>8} {:>6} {:>8} {:>8} {:>8} {:>8}",
            "Name", "Path", "Weight", "Reqs", "Fails", "Share", "Mean", "P95", "P99"
        );
        println!(
            "   {:6} {:18} {:>6} {:>8} {:>6} {:>8} {:>8} {:>8} {:>8}",
            "────", "────", "──────", "────", "─────", "─────", "────", "───", "───"
        );
        for task in &self.tasks {
            println!(
                "   {:6} {:18} {:>6} {:>8} {:>6} {:>7.1}% {:>8} {:>8} {:>8}",
                task.name,
                task.path,
                task.weight,
                task.requests,
                task.failures,
                task.share * 100.0,
                format_ms(task.mean_ms),
                format_ms(task.p95_ms),
                format_ms(task.p99_ms)
            );
        }
        println!(
            "   {:6} {:18} {:>6} {:>8} {:>6} {:>8} {:>8} {:>8} {:>8}",
            "Total",
            "",
            "",
            self.total_requests,
            self.total_failures,
            "",
            "",
            "",
            format_ms(self.p99_ms)
        );

        if !self.observed.is_empty() {
            println!();
            println!(" ─── Observed responses (all reported as success) ─────────────────────");
            for (status, count) in &self.observed {
                println!("   {:18} {:>8}", status, count);
            }
        }
        println!();
        println!("═══════════════════════════════════════════════════════════════════════");
        println!();
    }
}

fn format_ms(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{:.1}ms", v),
        None => "N/A".to_string(),
    }
}
