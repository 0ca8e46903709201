use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::Utc;
use clap::Parser;
use frodo_loadgen::cli::{Cli, Command};
use frodo_loadgen::telemetry::{init_tracing, install_metrics_exporter};
use frodo_loadgen::{Config, Engine, HttpTransport, RunReport, TaskProfile, run_stream};
use tokio::sync::watch;
use tracing::{info, warn};

/// Flip the returned receiver to true on Ctrl+C; a second Ctrl+C exits at once
fn shutdown_on_ctrl_c() -> watch::Receiver<bool> {
    let (tx, rx) = watch::channel(false);
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        info!("Received Ctrl+C, stopping (press again to exit immediately)");
        let _ = tx.send(true);

        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Received second Ctrl+C, exiting without a report");
            std::process::exit(130);
        }
    });
    rx
}

async fn run(config: Config) -> Result<()> {
    config.validate()?;

    if let Some(addr) = config.metrics_addr {
        install_metrics_exporter(addr).context("Failed to install Prometheus exporter")?;
        info!("Serving Prometheus metrics on {}", addr);
    }

    let profile = Arc::new(TaskProfile::channels());
    let transport = Arc::new(HttpTransport::new(&config.host, &config.http)?);
    info!("Target host: {}", config.host);
    if config.engine.run_time.is_none() && config.engine.iterations.is_none() {
        info!("No run time or iteration limit set, running until Ctrl+C");
    }

    let engine = Engine::new(config.engine.clone(), profile.clone(), transport);
    let started_at = Utc::now();
    let stats = engine.run(shutdown_on_ctrl_c()).await;

    let report = RunReport::from_stats(&stats, &profile, &config.host, started_at);
    report.print_summary();

    if let Some(ref path) = config.json_report {
        report
            .write_json(path)
            .with_context(|| format!("Failed to write JSON report to {:?}", path))?;
        info!("JSON report written to {:?}", path);
    }

    Ok(())
}

fn list_tasks() {
    let profile = TaskProfile::channels();
    println!("{} ({} tasks)", profile.name(), profile.tasks().len());
    for task in profile.tasks() {
        println!(
            "  {:6} {:18} weight {:>2}  ({:.1}%)",
            task.name,
            task.path,
            task.weight,
            profile.share(&task.name).unwrap_or(0.0) * 100.0
        );
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // Load configuration from environment, then apply command line flags
    let mut config = Config::from_env();

    match cli.command {
        Command::Run(args) => {
            args.apply(&mut config);
            run(config).await?;
        }
        Command::Tasks => list_tasks(),
        Command::Stream(args) => {
            args.apply(&mut config);
            config.validate_stream()?;
            let summary = run_stream(&config.stream, shutdown_on_ctrl_c()).await?;
            println!(
                "Streams: {} opened, {} failed, {} lines, {} bytes",
                summary.opened, summary.failed, summary.lines, summary.bytes
            );
        }
    }

    Ok(())
}
