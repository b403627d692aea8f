//! # PX4 Bridge
//!
//! Translate generic multi-rotor commands into PX4 attitude targets, and PX4
//! state, battery and RC telemetry back into generic status records.
//!
//! Records arrive and leave as JSON-lines envelopes on stdin/stdout. Logs go to
//! stderr.

use anyhow::{Context, Result};
use clap::Parser;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use tokio::task::{JoinError, JoinHandle};
use tracing::{debug, info, warn};

use px4_bridge::bridge::router::{Outbound, Router};
use px4_bridge::bridge::Bridge;
use px4_bridge::config::Config;
use px4_bridge::telemetry::RecordLogger;
use px4_bridge::transport::jsonl::{read_envelopes, write_envelopes};
use px4_bridge::transport::TopicQueues;

/// Number of handled records between status log messages
const LOG_INTERVAL_RECORDS: u64 = 1000;

/// Name of the thread reading stdin
const READER_THREAD_NAME: &str = "stdin-reader";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "px4-bridge", version, about)]
struct Args {
    /// Path to a TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,
}

/// Main entry point for PX4 Bridge application
///
/// # Control Flow
///
/// 1. **Initialization**
///    - Parse arguments and load configuration
///    - Set up logging to stderr
///    - Build the routing table and one keep-last queue per topic
///
/// 2. **Main Loop**
///    - A reader thread feeds stdin envelopes into the inbound queues
///    - Inbound records are dispatched to their handler one at a time
///    - A writer task drains published records to stdout
///
/// 3. **Graceful Shutdown**
///    - Stop on Ctrl+C or end of input
///    - Flush pending outbound records
///    - Log record counts
///
/// # Errors
///
/// Returns error if:
/// - The configuration file cannot be read or is invalid
/// - The record log directory cannot be created
/// - The reader thread cannot be spawned
///
/// # Examples
///
/// ```bash
/// echo '{"topic": "/shafter3/mavros/state", "msg": {"mode": "OFFBOARD", "armed": true}}' \
///     | cargo run --release
/// ```
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.config {
        Some(path) => Config::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => Config::default(),
    };

    // Initialize logging; stdout carries the data stream
    let level: tracing::Level = config
        .logging
        .level
        .parse()
        .context("Invalid logging level")?;
    let (log_writer, _log_guard) = tracing_appender::non_blocking(std::io::stderr());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .with_writer(log_writer)
        .init();

    info!("PX4 Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    if let Some(path) = &args.config {
        info!("Loaded configuration from {}", path.display());
    }

    let router = Router::new(&config.topics, &config.queues);
    let mut bridge = Bridge::new(&config.bridge);

    for route in router.routes() {
        debug!("Subscribing {} (depth {}) -> {:?}", route.topic, route.depth, route.handler);
    }
    for ad in router.outbound() {
        debug!("Advertising {} (depth {}) for {:?}", ad.topic, ad.depth, ad.kind);
    }

    let inbound = Arc::new(inbound_queues(&router));
    let outbound = Arc::new(outbound_queues(&router));

    let mut recorder = if config.telemetry.enabled {
        Some(RecordLogger::new(&config.telemetry)?)
    } else {
        None
    };

    // Blocking stdin lives on its own thread so shutdown never waits on it
    let reader = {
        let inbound = Arc::clone(&inbound);
        thread::Builder::new()
            .name(READER_THREAD_NAME.to_string())
            .spawn(move || {
                let result = read_envelopes(std::io::stdin().lock(), &inbound);
                inbound.close();
                result
            })
            .context("Failed to spawn stdin reader")?
    };

    let mut writer = {
        let outbound = Arc::clone(&outbound);
        tokio::spawn(async move {
            let mut stdout = tokio::io::stdout();
            write_envelopes(&mut stdout, &outbound, |topic, record| {
                if let Some(logger) = recorder.as_mut() {
                    if let Err(e) = logger.record(topic, record) {
                        warn!("Failed to record {}: {}", topic, e);
                    }
                }
            })
            .await
        })
    };

    info!("Bridging {} inbound and {} outbound topics", router.routes().len(), router.outbound().len());
    info!("Press Ctrl+C to exit");

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl+C: {}", e);
        }
    };

    let (stop, totals) =
        run_dispatch(&router, &mut bridge, &inbound, &outbound, &mut writer, shutdown).await;

    inbound.close();
    outbound.close();

    // An output failure already consumed the writer result
    if stop != Stop::OutputFailed {
        report_writer(writer.await);
    }

    if reader.is_finished() {
        match reader.join() {
            Ok(Ok(accepted)) => debug!("Read {} envelopes", accepted),
            Ok(Err(e)) => warn!("Input stopped early: {}", e),
            Err(_) => warn!("Reader thread panicked"),
        }
    }

    info!(
        "Total records handled: {} ({} published, {} failed, {} dropped inbound, {} dropped outbound)",
        totals.handled,
        totals.published,
        totals.failed,
        inbound.dropped(),
        outbound.dropped()
    );

    Ok(())
}

/// Why the dispatch loop stopped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    /// Stdin reached its end and every inbound record was handled
    InputClosed,
    /// The stdout writer ended; nothing would drain published records
    OutputFailed,
    /// Ctrl+C
    Interrupted,
}

/// Record counters of one dispatch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Totals {
    handled: u64,
    published: u64,
    failed: u64,
}

/// Writer task handle
type Writer = JoinHandle<px4_bridge::error::Result<u64>>;

/// Inbound queues, one per route
fn inbound_queues(router: &Router) -> TopicQueues<serde_json::Value> {
    TopicQueues::new(router.routes().iter().map(|r| (r.topic.clone(), r.depth)))
}

/// Outbound queues, one per advertisement
fn outbound_queues(router: &Router) -> TopicQueues<Outbound> {
    TopicQueues::new(router.outbound().iter().map(|ad| (ad.topic.clone(), ad.depth)))
}

/// Dispatches inbound records until input closes, output fails or `shutdown`
/// completes.
///
/// Per-record failures are logged and counted; they never stop the loop.
async fn run_dispatch<S: Future>(
    router: &Router,
    bridge: &mut Bridge,
    inbound: &TopicQueues<serde_json::Value>,
    outbound: &TopicQueues<Outbound>,
    writer: &mut Writer,
    shutdown: S,
) -> (Stop, Totals) {
    let mut publisher: &TopicQueues<Outbound> = outbound;
    let mut totals = Totals::default();

    tokio::pin!(shutdown);

    let stop = loop {
        tokio::select! {
            next = inbound.pop() => {
                let (topic, payload) = match next {
                    Some(item) => item,
                    None => {
                        info!("Input closed, shutting down...");
                        break Stop::InputClosed;
                    }
                };

                totals.handled += 1;
                match router.dispatch(&topic, payload, bridge, &mut publisher) {
                    Ok(count) => totals.published += count as u64,
                    Err(e) => {
                        totals.failed += 1;
                        warn!("Skipping record on {}: {}", topic, e);
                    }
                }

                if totals.handled % LOG_INTERVAL_RECORDS == 0 {
                    info!(
                        "Handled {} records ({} published, {} failed)",
                        totals.handled, totals.published, totals.failed
                    );
                }
            }

            // Outbound queues are only closed after this loop, so the writer
            // ending here means stdout is gone
            result = &mut *writer => {
                report_writer(result);
                warn!("Output stopped, shutting down...");
                break Stop::OutputFailed;
            }

            // Handle Ctrl+C for graceful shutdown
            _ = &mut shutdown => {
                info!("Received Ctrl+C, shutting down...");
                break Stop::Interrupted;
            }
        }
    };

    (stop, totals)
}

/// Logs how the writer task ended
fn report_writer(result: std::result::Result<px4_bridge::error::Result<u64>, JoinError>) {
    match result {
        Ok(Ok(written)) => debug!("Wrote {} envelopes", written),
        Ok(Err(e)) => warn!("Output stopped early: {}", e),
        Err(e) => warn!("Writer task failed: {}", e),
    }
}
