//! TempVis - Main Entry Point
//!
//! Runs the temperature engine and prints a periodic summary of every
//! channel to stdout, either as text lines or as JSON snapshots.

use anyhow::Context;
use std::time::{Duration, Instant};
use tempvis_rs::config::{EngineConfig, LoggingSettings};
use tempvis_rs::engine::{Engine, EngineHandle, EngineMessage};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "info,tempvis_rs=debug";

fn main() -> anyhow::Result<()> {
    let config = EngineConfig::load_default_location();

    // Keep the guard alive so buffered file output is flushed on exit
    let _log_guard = init_logging(&config.logging);

    tracing::info!("Starting TempVis engine");

    let report = config.report;
    let (engine, handle) = Engine::new(config);
    let worker = engine.spawn().context("failed to spawn engine thread")?;

    let started = Instant::now();
    let interval = Duration::from_millis(report.interval_ms.max(1));
    let deadline = report.duration_secs.map(Duration::from_secs);

    while handle.is_running() {
        std::thread::sleep(interval);

        if !log_messages(&handle) {
            break;
        }

        let snapshot = handle.snapshot();
        if report.json {
            println!("{}", snapshot.to_json()?);
        } else {
            for summary in snapshot.summaries() {
                println!(
                    "{:<12} {:>8.2} {:<4} avg {:>6.2} min {:>6.2} max {:>6.2} {:>+7.2}%",
                    summary.name,
                    summary.current_value,
                    summary.status,
                    summary.stats.average,
                    summary.stats.min,
                    summary.stats.max,
                    summary.stats.change_percent,
                );
            }
        }

        if deadline.is_some_and(|limit| started.elapsed() >= limit) {
            break;
        }
    }

    tracing::info!("Shutting down...");
    handle.shutdown();
    if worker.join().is_err() {
        anyhow::bail!("engine thread panicked");
    }

    Ok(())
}

/// Log worker messages; returns false once the worker reports shutdown
fn log_messages(handle: &EngineHandle) -> bool {
    for msg in handle.drain() {
        match msg {
            EngineMessage::Stats(stats) => tracing::debug!(
                "{} ticks, {:.1} ticks/s, avg {:.0} us, {} dropped",
                stats.ticks,
                stats.effective_tick_rate,
                stats.avg_tick_time_us,
                stats.dropped_messages
            ),
            EngineMessage::BreachChanged { id, status } => {
                tracing::info!("{} limit status: {}", id, status)
            }
            EngineMessage::Shutdown => return false,
            other => tracing::trace!("{:?}", other),
        }
    }
    true
}

fn init_logging(settings: &LoggingSettings) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(settings.filter.as_deref().unwrap_or(DEFAULT_FILTER))
    });

    let (file_layer, guard) = match &settings.directory {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, "tempvis.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .init();

    guard
}
