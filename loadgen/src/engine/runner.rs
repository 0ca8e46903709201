//! Engine: spawns simulated clients and aggregates their outcomes

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{mpsc, watch};
use tracing::{debug, info, warn};

use super::settings::EngineSettings;
use super::stats::RunStats;
use super::user::{IterationBudget, SimulatedUser, UserEvent};
use crate::profile::TaskProfile;
use crate::transport::Transport;

/// Capacity of the outcome channel between clients and the collector
const EVENT_CHANNEL_CAPACITY: usize = 10_000;

/// Lower bound for the progress log interval
const MIN_REPORT_INTERVAL: Duration = Duration::from_millis(100);

/// Hosts a task profile and drives it against a transport
pub struct Engine {
    settings: EngineSettings,
    profile: Arc<TaskProfile>,
    transport: Arc<dyn Transport>,
}

impl Engine {
    pub fn new(
        settings: EngineSettings,
        profile: Arc<TaskProfile>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            settings,
            profile,
            transport,
        }
    }

    /// Run until the run time elapses, the iteration budget is spent,
    /// or `shutdown` flips to true. A request still waiting for headers when
    /// the run stops is dropped; one reading its body is cut short and counted.
    pub async fn run(&self, shutdown: watch::Receiver<bool>) -> RunStats {
        let start = Instant::now();
        let settings = &self.settings;

        info!(
            "Starting profile '{}' against {}: {} users at {}/s",
            self.profile.name(),
            self.transport.host(),
            settings.users,
            settings.spawn_rate
        );

        let (stop_tx, stop_rx) = watch::channel(false);
        let budget = Arc::new(IterationBudget::new(settings.iterations));
        let (tx, rx) = mpsc::channel::<UserEvent>(EVENT_CHANNEL_CAPACITY);

        let collector = tokio::spawn(collect(
            rx,
            RunStats::for_profile(&self.profile),
            settings.report_interval.max(MIN_REPORT_INTERVAL),
        ));
        let controller = tokio::spawn(stop_when_done(settings.run_time, shutdown, stop_tx));

        let spawn_interval =
            Duration::try_from_secs_f64(1.0 / settings.spawn_rate).unwrap_or(Duration::ZERO);
        let mut stop_watch = stop_rx.clone();
        let mut handles = Vec::with_capacity(settings.users);

        for id in 0..settings.users {
            if id > 0 && !spawn_interval.is_zero() {
                tokio::select! {
                    _ = tokio::time::sleep(spawn_interval) => {}
                    _ = wait_for_stop(&mut stop_watch) => {}
                }
            }
            if *stop_rx.borrow() || budget.is_exhausted() {
                debug!("Stopping spawn after {} simulated clients", id);
                break;
            }

            let user = SimulatedUser {
                id,
                profile: self.profile.clone(),
                transport: self.transport.clone(),
                budget: budget.clone(),
                wait: settings.wait,
                rng: SimulatedUser::rng_for(id, settings.seed),
                events: tx.clone(),
                stop: stop_rx.clone(),
            };
            handles.push(tokio::spawn(user.run()));
        }

        // Drop the original sender so the collector ends with the last client
        drop(tx);

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Simulated client task failed: {}", e);
            }
        }
        controller.abort();

        let mut stats = match collector.await {
            Ok(stats) => stats,
            Err(e) => {
                warn!("Statistics collector failed: {}", e);
                RunStats::for_profile(&self.profile)
            }
        };
        stats.duration = start.elapsed();

        info!(
            "Run finished: {} requests, {} failures in {:.1}s",
            stats.total_requests(),
            stats.total_failures(),
            stats.duration.as_secs_f64()
        );
        stats
    }
}

/// Resolve once `rx` reads true; never resolves if the sender goes away first
pub async fn wait_for_stop(rx: &mut watch::Receiver<bool>) {
    loop {
        if *rx.borrow() {
            return;
        }
        if rx.changed().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

async fn stop_when_done(
    run_time: Option<Duration>,
    mut shutdown: watch::Receiver<bool>,
    stop_tx: watch::Sender<bool>,
) {
    let deadline = async {
        match run_time {
            Some(run_time) => tokio::time::sleep(run_time).await,
            None => std::future::pending::<()>().await,
        }
    };

    tokio::select! {
        _ = deadline => info!("Run time elapsed, stopping simulated clients"),
        _ = wait_for_stop(&mut shutdown) => info!("Shutdown requested, stopping simulated clients"),
    }
    let _ = stop_tx.send(true);
}

async fn collect(
    mut rx: mpsc::Receiver<UserEvent>,
    mut stats: RunStats,
    report_interval: Duration,
) -> RunStats {
    let mut ticker = tokio::time::interval(report_interval);
    // First tick completes immediately
    ticker.tick().await;
    let mut active = 0usize;

    loop {
        tokio::select! {
            event = rx.recv() => match event {
                Some(UserEvent::Spawned { user }) => {
                    active += 1;
                    stats.peak_users = stats.peak_users.max(active);
                    metrics::gauge!("frodo_loadgen_users_active").set(active as f64);
                    debug!("Simulated client {} started", user);
                }
                Some(UserEvent::Request(outcome)) => {
                    metrics::counter!("frodo_loadgen_requests_total", "task" => outcome.task.clone())
                        .increment(1);
                    metrics::histogram!(
                        "frodo_loadgen_request_duration_seconds",
                        "task" => outcome.task.clone()
                    )
                    .record(outcome.latency.as_secs_f64());
                    stats.record(&outcome);
                }
                Some(UserEvent::Finished { user }) => {
                    active = active.saturating_sub(1);
                    metrics::gauge!("frodo_loadgen_users_active").set(active as f64);
                    debug!("Simulated client {} finished", user);
                }
                None => break,
            },
            _ = ticker.tick() => {
                info!(
                    users = active,
                    requests = stats.total_requests(),
                    failures = stats.total_failures(),
                    "Progress"
                );
            }
        }
    }

    stats
}
