//! CLI entry point for the bus tracker.
//!
//! `watch` follows the live feed and keeps a marker set in sync with it;
//! `snapshot` fetches and decodes the feed once.

use anyhow::{Context, Result};
use bus_tracker::{
    config::TrackerConfig,
    display::LoggingDisplay,
    fetch::{BasicClient, HttpFeedSource, fetch_or_read},
    output::{CycleHistory, log_snapshot, write_snapshot_csv},
    parser::parse_feed,
    poll::PollLoop,
    stats::CycleStats,
};
use clap::{Parser, Subcommand};
use std::ffi::OsStr;
use std::path::Path;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "bus_tracker")]
#[command(about = "Follow live bus positions from an XML feed", long_about = None)]
struct Cli {
    /// JSON config file with endpoint, interval and timeouts
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll the feed forever and keep bus markers in sync. Ctrl+C stops.
    Watch {
        /// Feed URL (overrides config file and BUS_FEED_URL)
        #[arg(short, long)]
        endpoint: Option<String>,

        /// Seconds to wait after one cycle finishes before starting the next
        #[arg(short, long)]
        interval: Option<u64>,

        /// CSV file to append one row per cycle to
        #[arg(short, long)]
        record: Option<String>,
    },
    /// Fetch and decode the feed once, from a file or URL
    Snapshot {
        /// Path to file or URL to fetch (defaults to the configured endpoint)
        #[arg(value_name = "FILE_OR_URL")]
        source: Option<String>,

        /// CSV file to append the cycle record to
        #[arg(short, long)]
        output: Option<String>,

        /// CSV file to write the decoded buses to, replacing its contents
        #[arg(short, long)]
        buses: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/bus_tracker.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("bus_tracker.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => TrackerConfig::load(path)?,
        None => TrackerConfig::default(),
    }
    .with_env();

    match cli.command {
        Commands::Watch {
            endpoint,
            interval,
            record,
        } => {
            let config = config
                .with_endpoint_override(endpoint)
                .with_poll_interval_override(interval);
            watch(&config, record).await?;
        }
        Commands::Snapshot {
            source,
            output,
            buses,
        } => {
            let source = match source {
                Some(source) => source,
                None => config.require_endpoint()?.to_string(),
            };
            snapshot(&config, &source, output.as_deref(), buses.as_deref()).await?;
        }
    }

    Ok(())
}

/// Runs the poll loop until Ctrl+C, then removes every marker.
#[tracing::instrument(skip(config, record))]
async fn watch(config: &TrackerConfig, record: Option<String>) -> Result<()> {
    let endpoint = config.require_endpoint()?;
    let client = BasicClient::new(config.timeouts()).context("Failed to build HTTP client")?;
    let source = HttpFeedSource::new(client, endpoint);

    let mut poll = PollLoop::new(source, LoggingDisplay::new(), config.poll_interval());
    if let Some(path) = record {
        info!(path = %path, "Recording cycle history");
        poll = poll.with_history(CycleHistory::new(path));
    }

    let cancel = CancellationToken::new();
    let ctrl_c_cancel = cancel.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Ctrl+C received, stopping"),
            Err(e) => error!(error = %e, "Failed to listen for Ctrl+C, stopping"),
        }
        ctrl_c_cancel.cancel();
    });

    poll.run(&cancel).await;
    let live_markers = poll.shutdown().live_markers();
    info!(live_markers, "Shutdown complete");
    Ok(())
}

/// Fetches the feed once and logs the decoded snapshot.
#[tracing::instrument(skip(config, output, buses))]
async fn snapshot(
    config: &TrackerConfig,
    source: &str,
    output: Option<&str>,
    buses: Option<&str>,
) -> Result<()> {
    let client = BasicClient::new(config.timeouts()).context("Failed to build HTTP client")?;

    let stats = match fetch_or_read(&client, source).await {
        Ok(bytes) => match parse_feed(&bytes) {
            Ok(snapshot) => {
                log_snapshot(&snapshot);
                if let Some(path) = buses {
                    write_snapshot_csv(Path::new(path), &snapshot)?;
                }
                info!(
                    active = snapshot.len(),
                    inactive = snapshot.inactive(),
                    "Feed decoded"
                );
                CycleStats::from_snapshot(&snapshot)
            }
            Err(e) => {
                error!(error = %e, "Feed parse failed");
                CycleStats::from_error("parse_error", &e.to_string())
            }
        },
        Err(e) => {
            error!(error = %e, "Feed fetch failed");
            CycleStats::from_error(e.kind(), &e.to_string())
        }
    }
    .with_source(1, source);

    if let Some(path) = output {
        CycleHistory::new(path).append(&stats)?;
    }

    Ok(())
}
